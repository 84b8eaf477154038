//! CLI entry point for DataScout.

use anyhow::{Result, anyhow};
use clap::Parser;
use datascout::export::{cleaned_file_name, write_csv};
use datascout::{
    RunReport, ScoutConfig, Session, Upload, basic_stats_with, categorical_columns,
    correlation_heatmap, is_failure_response, numeric_columns,
};
use dotenv::dotenv;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[cfg(feature = "ai")]
use datascout::ai::{TogetherConfig, TogetherProvider};
#[cfg(feature = "ai")]
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LLM-assisted data exploration",
    long_about = "Load a CSV or spreadsheet, clean it with a model-generated plan, then\n\
                  summarize and chart the result. PDF, DOCX and TXT files are printed as text.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  TOGETHER_API_KEY    API key for the Together endpoint (a .env file works too)\n\n\
                  EXAMPLES:\n  \
                  # Clean, summarize and chart\n  \
                  datascout -i titanic.csv\n\n  \
                  # Pick the charted columns and ask a question\n  \
                  datascout -i titanic.csv --categorical Sex --numeric Age -q \"Who survived?\"\n\n  \
                  # Basic cleaning only (no model)\n  \
                  datascout -i titanic.csv --no-ai"
)]
struct Args {
    /// File to explore (csv, xlsx, xls, pdf, docx, txt)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the cleaned data, statistics and charts
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Use basic cleaning only; never call the model
    #[arg(long, default_value = "false")]
    no_ai: bool,

    /// Question to ask about the cleaned data
    #[arg(short, long)]
    question: Option<String>,

    /// Categorical column to chart (default: the first text column)
    #[arg(long)]
    categorical: Option<String>,

    /// Numeric column to chart (default: the first numeric column)
    #[arg(long)]
    numeric: Option<String>,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,

    /// TrueType font for chart text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Model name for the chat-completion endpoint
    #[arg(long)]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and results)
    #[arg(long)]
    quiet: bool,

    /// Write a JSON run report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    // Load environment variables from .env file
    dotenv().ok();

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let mut builder = ScoutConfig::builder()
        .output_dir(&args.output)
        .use_ai(!args.no_ai);
    if let Some(font) = &args.font {
        builder = builder.font_path(font);
    }
    let config = builder.build()?;

    let mut session = Session::new(config);
    if !args.no_ai {
        session = attach_provider(session, &args);
    }
    let output_dir = session.config().output_dir.clone();

    let data = match session.load(&args.input)? {
        Upload::Text(text) => {
            println!("{}", "=".repeat(80));
            println!("EXTRACTED TEXT: {}", args.input.display());
            println!("{}", "=".repeat(80));
            println!("{}", text);
            return Ok(());
        }
        Upload::Table(df) => df,
    };
    info!("Loaded {} rows × {} columns", data.height(), data.width());

    let outcome = session.clean_with_ai(&data);
    println!("{}", outcome.status_message());
    if let Some(report) = &outcome.report {
        for step in &report.steps {
            info!(
                "  step {}: {} ({:?}) {}",
                step.index,
                step.operation.as_deref().unwrap_or("-"),
                step.outcome,
                step.description
            );
        }
    }
    let cleaned = &outcome.data;

    let mut run_report = RunReport::new(
        &args.input,
        outcome.source,
        outcome.original_shape,
        outcome.cleaned_shape(),
    );
    run_report.model = session.model_name();
    run_report.plan = outcome.plan.clone();
    run_report.cleaning = outcome.report.clone();

    let cleaned_path = write_csv(cleaned, output_dir.join(cleaned_file_name(&args.input)))?;
    run_report.add_output(&cleaned_path);

    // Summary statistics
    let stats = basic_stats_with(cleaned, session.config().categorical_max_distinct)?;
    println!();
    println!("{}", "=".repeat(80));
    println!("SUMMARY ({})", outcome.source.display_name());
    println!("{}", "=".repeat(80));
    println!("Rows: {} | Columns: {}", cleaned.height(), cleaned.width());
    print!("{}", stats);
    let stats_path = write_csv(&stats.to_dataframe()?, output_dir.join(stats_file_name(&args.input)))?;
    run_report.add_output(&stats_path);

    if !args.no_charts {
        for path in draw_charts(&session, cleaned, &args)? {
            run_report.add_output(path);
        }
    }

    if let Some(question) = &args.question {
        match session.ask(question) {
            Ok(answer) => {
                println!();
                println!("QUESTION: {}", question);
                if is_failure_response(&answer) {
                    warn!("The model could not answer the question");
                }
                println!("{}", answer);
            }
            Err(e) => warn!("Question not asked: {}", e),
        }
    }

    if args.emit_report {
        let report_path = output_dir.join(format!("{}_report.json", file_stem(&args.input)));
        run_report.write_json(&report_path)?;
        println!("Report: {}", report_path.display());
    }

    println!("Cleaned data: {}", cleaned_path.display());
    Ok(())
}

#[cfg(feature = "ai")]
fn attach_provider(session: Session, args: &Args) -> Session {
    let mut config = TogetherConfig::builder().timeout_secs(args.timeout);
    if let Some(model) = &args.model {
        config = config.model(model);
    }

    match datascout::ai::SecretString::from_env() {
        Some(key) => match TogetherProvider::with_config(key, config.build()) {
            Ok(provider) => {
                info!("Using model {}", provider.config().model);
                session.with_provider(Arc::new(provider))
            }
            Err(e) => {
                warn!("Could not create the model client, using basic cleaning: {}", e);
                session
            }
        },
        None => {
            warn!("TOGETHER_API_KEY not set, using basic cleaning");
            session
        }
    }
}

#[cfg(not(feature = "ai"))]
fn attach_provider(session: Session, _args: &Args) -> Session {
    warn!("Built without the `ai` feature, using basic cleaning");
    session
}

#[cfg(feature = "render")]
fn draw_charts(session: &Session, df: &DataFrame, args: &Args) -> Result<Vec<PathBuf>> {
    use datascout::eda::categorical_chart_with;
    use datascout::eda::numerical_chart_with;
    use datascout::eda::render::{ChartRenderer, chart_file_name};

    let config = session.config();
    let renderer = ChartRenderer::new(config);
    let mut written = Vec::new();

    let categorical = args
        .categorical
        .clone()
        .or_else(|| categorical_columns(df).into_iter().next());
    if let Some(column) = categorical {
        match categorical_chart_with(df, &column, config.top_categories) {
            Some(spec) => match renderer.bar_chart(&spec, config.output_dir.join(chart_file_name(&column))) {
                Ok(path) => written.push(path),
                Err(e) => warn!("Chart for '{}' not drawn: {}", column, e),
            },
            None => warn!("No values to chart in '{}'", column),
        }
    }

    let numeric = args
        .numeric
        .clone()
        .or_else(|| numeric_columns(df).into_iter().next());
    if let Some(column) = numeric {
        match numerical_chart_with(df, &column, config.max_histogram_bins) {
            Some(spec) => match renderer.histogram(&spec, config.output_dir.join(chart_file_name(&column))) {
                Ok(path) => written.push(path),
                Err(e) => warn!("Chart for '{}' not drawn: {}", column, e),
            },
            None => warn!("'{}' is not a numeric column with values", column),
        }
    }

    match correlation_heatmap(df) {
        Some(spec) => match renderer.heatmap(&spec, config.output_dir.join("correlation_heatmap.png")) {
            Ok(path) => written.push(path),
            Err(e) => warn!("Correlation heatmap not drawn: {}", e),
        },
        None => info!("Not enough numeric columns to show a correlation heatmap"),
    }

    for path in &written {
        println!("Chart: {}", path.display());
    }
    Ok(written)
}

#[cfg(not(feature = "render"))]
fn draw_charts(_session: &Session, df: &DataFrame, args: &Args) -> Result<Vec<PathBuf>> {
    use datascout::{categorical_chart, numerical_chart};

    warn!("Built without the `render` feature, printing chart data instead");
    let categorical = args
        .categorical
        .clone()
        .or_else(|| categorical_columns(df).into_iter().next());
    if let Some(spec) = categorical.and_then(|c| categorical_chart(df, &c)) {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    }
    let numeric = args
        .numeric
        .clone()
        .or_else(|| numeric_columns(df).into_iter().next());
    if let Some(spec) = numeric.and_then(|c| numerical_chart(df, &c)) {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    }
    if let Some(spec) = correlation_heatmap(df) {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    }
    Ok(Vec::new())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string()
}

fn stats_file_name(input: &Path) -> String {
    format!("{}_stats.csv", file_stem(input))
}

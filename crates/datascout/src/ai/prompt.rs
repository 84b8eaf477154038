//! Prompt construction for cleaning plans and free-form questions.

use crate::config::ScoutConfig;
use crate::export::to_csv_string;
use crate::utils::unique_samples;
use polars::prelude::*;

/// Build the prompt that asks the model for a cleaning plan.
///
/// The prompt carries a column table (dtype and a few distinct values per
/// column, in order of first appearance) and the leading rows as CSV with a
/// row-index column.
pub fn cleaning_prompt(df: &DataFrame, config: &ScoutConfig) -> PolarsResult<String> {
    let column_info = column_info_table(df, config.prompt_unique_values)?;
    let sample = df
        .head(Some(config.prompt_sample_rows))
        .with_row_index("".into(), None)?;
    let sample_csv = to_csv_string(&sample)?;

    Ok(format!(
        "You are an expert data scientist. Your task is to create a data cleaning plan for the following dataset.\n\
        Analyze the sample data and column information provided.\n\
        Identify potential issues and suggest cleaning operations.\n\n\
        **Column Information:**\n\
        {column_info}\n\n\
        **Data Sample (first {rows} rows):**\n\
        ```csv\n\
        {sample_csv}```\n\n\
        **Instructions:**\n\
        Based on your analysis, provide a step-by-step cleaning plan in JSON format.\n\
        The JSON object must have a \"cleaning_plan\" key holding a list of steps, where each step is an object with an \"operation\" and \"details\".\n\
        Supported operations:\n\
        - handle_missing: details {{\"column\", \"strategy\": \"median\" | \"mean\" | \"mode\" | \"drop\"}}\n\
        - change_type: details {{\"column\", \"new_type\": \"numeric\" | \"int\" | \"float\" | \"str\" | \"bool\" | \"datetime\"}}\n\
        - remove_duplicates: no details\n\
        - normalize_text: details {{\"column\"}}\n\
        - map_values: details {{\"column\", \"mapping\": {{\"old\": \"new\"}}}}\n",
        rows = config.prompt_sample_rows,
    ))
}

/// Build the prompt for a free-form question about the cleaned data.
pub fn question_prompt(df: &DataFrame, question: &str, rows: usize) -> PolarsResult<String> {
    let data = to_csv_string(&df.head(Some(rows)))?;
    Ok(format!(
        "Based on the data, answer: {}\n\nData:\n{}",
        question, data
    ))
}

/// Render the per-column table: name, dtype, distinct sample values.
pub fn column_info_table(df: &DataFrame, max_values: usize) -> PolarsResult<String> {
    let mut rows: Vec<(String, String, String)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let samples = unique_samples(series, max_values)?;
        rows.push((
            series.name().to_string(),
            series.dtype().to_string(),
            format!("[{}]", samples.join(", ")),
        ));
    }

    let name_width = rows
        .iter()
        .map(|(n, _, _)| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("column".len());
    let dtype_width = rows
        .iter()
        .map(|(_, d, _)| d.chars().count())
        .max()
        .unwrap_or(0)
        .max("dtype".len());

    let mut table = format!(
        "{:<nw$}  {:<dw$}  unique_values_sample\n",
        "column",
        "dtype",
        nw = name_width,
        dw = dtype_width
    );
    for (name, dtype, samples) in rows {
        table.push_str(&format!(
            "{:<nw$}  {:<dw$}  {}\n",
            name,
            dtype,
            samples,
            nw = name_width,
            dw = dtype_width
        ));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df![
            "name" => [Some("Ann"), Some("Bob"), None, Some("Ann")],
            "age" => [Some(31i64), None, Some(45), Some(31)],
        ]
        .unwrap()
    }

    #[test]
    fn test_column_info_table() {
        let table = column_info_table(&sample_frame(), 5).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("column"));
        assert!(lines[1].starts_with("name"));
        assert!(lines[1].ends_with("[Ann, Bob, NaN]"));
        assert!(lines[2].ends_with("[31, NaN, 45]"));
    }

    #[test]
    fn test_cleaning_prompt_contents() {
        let config = ScoutConfig::default();
        let prompt = cleaning_prompt(&sample_frame(), &config).unwrap();

        assert!(prompt.contains("**Column Information:**"));
        assert!(prompt.contains("first 15 rows"));
        assert!(prompt.contains("\"cleaning_plan\""));
        // Row index column leads the CSV sample
        assert!(prompt.contains(",name,age\n0,Ann,31\n"));
    }

    #[test]
    fn test_cleaning_prompt_limits_rows() {
        let config = ScoutConfig::builder().prompt_sample_rows(2).build().unwrap();
        let prompt = cleaning_prompt(&sample_frame(), &config).unwrap();

        assert!(prompt.contains("1,Bob,\n"));
        assert!(!prompt.contains("2,,45"));
    }

    #[test]
    fn test_question_prompt() {
        let prompt = question_prompt(&sample_frame(), "How many people?", 10).unwrap();
        assert!(prompt.starts_with("Based on the data, answer: How many people?\n\nData:\nname,age\n"));
        assert!(prompt.contains("Ann,31"));
    }
}

//! PNG rendering of chart specifications with plotters.
//!
//! Text is drawn through `ab_glyph`, so a TrueType font has to be available:
//! either [`ScoutConfig::font_path`] or one of the usual system locations.
//! Without a font every render call fails with [`ScoutError::RenderFailed`].

use super::charts::{BarChartSpec, HistogramSpec, Orientation};
use super::correlation::HeatmapSpec;
use crate::config::ScoutConfig;
use crate::error::{Result, ScoutError};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Set once a font has been registered for the process.
static FONT_LOADED: OnceLock<PathBuf> = OnceLock::new();

fn render_err(e: impl std::fmt::Display) -> ScoutError {
    ScoutError::RenderFailed(e.to_string())
}

fn ensure_font(explicit: Option<&Path>) -> Result<()> {
    if let Some(path) = explicit
        && !path.is_file()
    {
        return Err(render_err(format!("font file {} not found", path.display())));
    }
    if FONT_LOADED.get().is_some() {
        return Ok(());
    }

    let candidate = explicit.map(Path::to_path_buf).or_else(|| {
        SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    });
    let Some(path) = candidate else {
        return Err(render_err(
            "no TrueType font found; set font_path in the configuration",
        ));
    };

    let bytes = std::fs::read(&path)
        .map_err(|e| render_err(format!("cannot read font {}: {}", path.display(), e)))?;
    // plotters keeps a reference for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| render_err(format!("{} is not a usable font", path.display())))?;

    debug!("Registered chart font {}", path.display());
    let _ = FONT_LOADED.set(path);
    Ok(())
}

/// Diverging blue-white-red scale for values in `[-1, 1]`.
fn rdbu_r(value: f64) -> RGBColor {
    const BLUE_END: (f64, f64, f64) = (33.0, 102.0, 172.0);
    const MIDDLE: (f64, f64, f64) = (247.0, 247.0, 247.0);
    const RED_END: (f64, f64, f64) = (178.0, 24.0, 43.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (MIDDLE, BLUE_END, -v)
    } else {
        (MIDDLE, RED_END, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Draws chart specifications to PNG files.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    font_path: Option<PathBuf>,
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(config: &ScoutConfig) -> Self {
        Self {
            font_path: config.font_path.clone(),
            width: 1200,
            height: 800,
        }
    }

    /// Override the image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(200);
        self.height = height.max(200);
        self
    }

    /// Render a bar chart.
    pub fn bar_chart(&self, spec: &BarChartSpec, path: impl AsRef<Path>) -> Result<PathBuf> {
        ensure_font(self.font_path.as_deref())?;
        let path = prepare_path(path.as_ref())?;
        let n = spec.bars.len().max(1) as i32;
        let max_count = spec.bars.iter().map(|b| b.count).max().unwrap_or(1) as f64;
        let labels: Vec<String> = spec.bars.iter().map(|b| b.label.clone()).collect();
        let label_for = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };

        // The backend borrows `path` until it is dropped.
        {
            let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            match spec.orientation {
                Orientation::Horizontal => {
                    let mut chart = ChartBuilder::on(&root)
                        .caption(&spec.title, (FONT_FAMILY, 28))
                        .margin(15)
                        .x_label_area_size(40)
                        .y_label_area_size(160)
                        .build_cartesian_2d(0f64..max_count * 1.15, (0i32..n).into_segmented())
                        .map_err(render_err)?;
                    chart
                        .configure_mesh()
                        .y_labels(n as usize)
                        .y_label_formatter(&label_for)
                        .x_desc("count")
                        .y_desc(spec.column.as_str())
                        .draw()
                        .map_err(render_err)?;
                    chart
                        .draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
                            let i = i as i32;
                            Rectangle::new(
                                [
                                    (0.0, SegmentValue::Exact(i)),
                                    (bar.count as f64, SegmentValue::Exact(i + 1)),
                                ],
                                BLUE.mix(0.7).filled(),
                            )
                        }))
                        .map_err(render_err)?;
                    chart
                        .draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
                            Text::new(
                                format!(" {}", bar.count),
                                (bar.count as f64, SegmentValue::CenterOf(i as i32)),
                                TextStyle::from((FONT_FAMILY, 14.0).into_font())
                                    .pos(Pos::new(HPos::Left, VPos::Center)),
                            )
                        }))
                        .map_err(render_err)?;
                }
                Orientation::Vertical => {
                    let mut chart = ChartBuilder::on(&root)
                        .caption(&spec.title, (FONT_FAMILY, 28))
                        .margin(15)
                        .x_label_area_size(60)
                        .y_label_area_size(60)
                        .build_cartesian_2d((0i32..n).into_segmented(), 0f64..max_count * 1.15)
                        .map_err(render_err)?;
                    chart
                        .configure_mesh()
                        .x_labels(n as usize)
                        .x_label_formatter(&label_for)
                        .x_desc(spec.column.as_str())
                        .y_desc("count")
                        .draw()
                        .map_err(render_err)?;
                    chart
                        .draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
                            let i = i as i32;
                            Rectangle::new(
                                [
                                    (SegmentValue::Exact(i), 0.0),
                                    (SegmentValue::Exact(i + 1), bar.count as f64),
                                ],
                                BLUE.mix(0.7).filled(),
                            )
                        }))
                        .map_err(render_err)?;
                }
            }

            root.present().map_err(render_err)?;
        }
        info!("Chart saved: {}", path.display());
        Ok(path)
    }

    /// Render a histogram with a box summary strip above it.
    pub fn histogram(&self, spec: &HistogramSpec, path: impl AsRef<Path>) -> Result<PathBuf> {
        ensure_font(self.font_path.as_deref())?;
        let path = prepare_path(path.as_ref())?;

        let x_min = spec.bins.first().map(|b| b.start).unwrap_or(0.0);
        let mut x_max = spec.bins.last().map(|b| b.end).unwrap_or(1.0);
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        let max_count = spec.bins.iter().map(|b| b.count).max().unwrap_or(1) as f64;

        {
            let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let root = root
                .titled(&spec.title, (FONT_FAMILY, 28))
                .map_err(render_err)?;
            let (upper, lower) = root.split_vertically((self.height as f64 * 0.2) as u32);

            {
                let b = &spec.box_summary;
                let mut chart = ChartBuilder::on(&upper)
                    .margin(10)
                    .y_label_area_size(60)
                    .build_cartesian_2d(x_min..x_max, 0f64..1f64)
                    .map_err(render_err)?;
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(b.q1, 0.25), (b.q3, 0.75)],
                        BLUE.mix(0.3).filled(),
                    )))
                    .map_err(render_err)?;
                let lines = vec![
                    vec![(b.q1, 0.25), (b.q3, 0.25), (b.q3, 0.75), (b.q1, 0.75), (b.q1, 0.25)],
                    vec![(b.median, 0.25), (b.median, 0.75)],
                    vec![(b.lower_whisker, 0.5), (b.q1, 0.5)],
                    vec![(b.q3, 0.5), (b.upper_whisker, 0.5)],
                    vec![(b.lower_whisker, 0.35), (b.lower_whisker, 0.65)],
                    vec![(b.upper_whisker, 0.35), (b.upper_whisker, 0.65)],
                ];
                chart
                    .draw_series(lines.into_iter().map(|pts| PathElement::new(pts, BLACK.stroke_width(2))))
                    .map_err(render_err)?;
                chart
                    .draw_series(
                        b.outliers
                            .iter()
                            .map(|x| Circle::new((*x, 0.5), 3, RED.filled())),
                    )
                    .map_err(render_err)?;
            }

            {
                let mut chart = ChartBuilder::on(&lower)
                    .margin(10)
                    .x_label_area_size(40)
                    .y_label_area_size(60)
                    .build_cartesian_2d(x_min..x_max, 0f64..max_count * 1.1)
                    .map_err(render_err)?;
                chart
                    .configure_mesh()
                    .x_desc(spec.column.as_str())
                    .y_desc("count")
                    .draw()
                    .map_err(render_err)?;
                chart
                    .draw_series(spec.bins.iter().map(|bin| {
                        Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], BLUE.mix(0.7).filled())
                    }))
                    .map_err(render_err)?;
            }

            root.present().map_err(render_err)?;
        }
        info!("Chart saved: {}", path.display());
        Ok(path)
    }

    /// Render an annotated correlation heatmap.
    pub fn heatmap(&self, spec: &HeatmapSpec, path: impl AsRef<Path>) -> Result<PathBuf> {
        ensure_font(self.font_path.as_deref())?;
        let path = prepare_path(path.as_ref())?;
        let n = spec.columns.len().max(1) as i32;
        let names = &spec.columns;
        let label_for = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(i) => names.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        // Row 0 is drawn at the top.
        let row_label_for = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(i) => names
                .get((n - 1 - *i) as usize)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        };

        {
            let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let mut chart = ChartBuilder::on(&root)
                .caption(&spec.title, (FONT_FAMILY, 28))
                .margin(15)
                .x_label_area_size(60)
                .y_label_area_size(160)
                .build_cartesian_2d((0i32..n).into_segmented(), (0i32..n).into_segmented())
                .map_err(render_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n as usize)
                .y_labels(n as usize)
                .x_label_formatter(&label_for)
                .y_label_formatter(&row_label_for)
                .draw()
                .map_err(render_err)?;

            let mut cells = Vec::with_capacity((n * n) as usize);
            for (i, row) in spec.matrix.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    let (x, y) = (j as i32, n - 1 - i as i32);
                    let color = value.map(rdbu_r).unwrap_or(RGBColor(200, 200, 200));
                    cells.push(Rectangle::new(
                        [
                            (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                            (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                        ],
                        color.filled(),
                    ));
                }
            }
            chart.draw_series(cells).map_err(render_err)?;

            let mut annotations = Vec::with_capacity((n * n) as usize);
            for i in 0..spec.matrix.len() {
                for j in 0..spec.matrix[i].len() {
                    let (x, y) = (j as i32, n - 1 - i as i32);
                    annotations.push(Text::new(
                        spec.annotation(i, j),
                        (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                        TextStyle::from((FONT_FAMILY, 16.0).into_font())
                            .pos(Pos::new(HPos::Center, VPos::Center)),
                    ));
                }
            }
            chart.draw_series(annotations).map_err(render_err)?;

            root.present().map_err(render_err)?;
        }
        info!("Chart saved: {}", path.display());
        Ok(path)
    }
}

fn prepare_path(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path.to_path_buf())
}

/// File-system friendly chart name, e.g. `Ticket Class` -> `Ticket_Class_chart.png`.
pub fn chart_file_name(column: &str) -> String {
    let safe: String = column
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_chart.png", safe)
}

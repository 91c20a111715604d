//! Chart rendering: three SVG figures from the aggregated series.
//!
//! Each chart is attempted independently. A failure is collected as a
//! `RenderError` in the outcome and never stops the remaining charts.

mod charts;
mod panels;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregator::ChartSeries;

/// The three figures produced per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    PriceAnalysis,
    RatingAnalysis,
    DiscountAnalysis,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::PriceAnalysis,
        ChartKind::RatingAnalysis,
        ChartKind::DiscountAnalysis,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::PriceAnalysis => "price_analysis.svg",
            ChartKind::RatingAnalysis => "rating_analysis.svg",
            ChartKind::DiscountAnalysis => "discount_analysis.svg",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::PriceAnalysis => "price analysis",
            ChartKind::RatingAnalysis => "rating analysis",
            ChartKind::DiscountAnalysis => "discount analysis",
        };
        f.write_str(name)
    }
}

/// Non-fatal artifact failure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{chart}: cannot create output directory {}: {source}", path.display())]
    OutputDir {
        chart: ChartKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{chart}: no data to plot")]
    NoData { chart: ChartKind },

    #[error("{chart}: drawing failed: {reason}")]
    Draw { chart: ChartKind, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Display settings shared by every chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub currency_symbol: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            currency_symbol: "€".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub path: PathBuf,
}

/// Result of a render pass: what was written and what failed.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub rendered: Vec<RenderedChart>,
    pub failures: Vec<RenderError>,
    /// True when chart rendering was turned off for the run.
    pub skipped: bool,
}

impl RenderOutcome {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Render all three charts into `output_dir`, creating it if missing.
pub fn render_all(series: &ChartSeries, output_dir: &Path, style: &ChartStyle) -> RenderOutcome {
    let mut outcome = RenderOutcome::default();
    for kind in ChartKind::ALL {
        match render_chart(kind, series, output_dir, style) {
            Ok(path) => {
                info!(chart = %kind, path = %path.display(), "chart saved");
                outcome.rendered.push(RenderedChart { kind, path });
            }
            Err(e) => {
                warn!(chart = %kind, error = %e, "chart skipped");
                outcome.failures.push(e);
            }
        }
    }
    outcome
}

/// Render one chart; returns the written path.
pub fn render_chart(
    kind: ChartKind,
    series: &ChartSeries,
    output_dir: &Path,
    style: &ChartStyle,
) -> Result<PathBuf, RenderError> {
    if series.is_empty() {
        return Err(RenderError::NoData { chart: kind });
    }
    std::fs::create_dir_all(output_dir).map_err(|source| RenderError::OutputDir {
        chart: kind,
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(kind.file_name());
    let drawn = match kind {
        ChartKind::PriceAnalysis => charts::price_analysis(&path, series, style),
        ChartKind::RatingAnalysis => charts::rating_analysis(&path, series, style),
        ChartKind::DiscountAnalysis => charts::discount_analysis(&path, series, style),
    };
    drawn.map_err(|e| RenderError::Draw {
        chart: kind,
        reason: e.to_string(),
    })?;
    Ok(path)
}

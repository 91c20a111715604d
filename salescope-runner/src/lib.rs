//! SaleScope Runner: configuration, aggregation, charts and reporting.
//!
//! This crate builds on `salescope-core` to provide:
//! - `AnalysisConfig` loaded from TOML
//! - Aggregation of a cleaned table into summaries and chart series
//! - SVG chart rendering (price, rating, discount figures)
//! - Text report and `summary.json` artifact
//! - `run_analysis`, the end-to-end pipeline

pub mod aggregator;
pub mod config;
pub mod pipeline;
pub mod render;
pub mod report;

pub use aggregator::{
    aggregate, AggregateOptions, Aggregates, AnalysisSummary, CategoryStats, ChartSeries,
    Correlations, FieldSummary, OverallStats, TopProduct,
};
pub use config::{AnalysisConfig, ConfigError};
pub use pipeline::{run_analysis, run_analysis_from_reader, AnalysisOutcome, RunError};
pub use render::{render_all, ChartKind, ChartStyle, RenderError, RenderOutcome, RenderedChart};
pub use report::{format_report, import_json, write_summary, AnalysisReport, SCHEMA_VERSION};

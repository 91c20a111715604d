//! Pipeline: load → clean → aggregate → render → report, in that order.
//!
//! Fatal failures (config, unreadable input, zero valid rows) abort before
//! any artifact is written. Chart and summary write failures are collected
//! in the outcome and the run still succeeds.

use chrono::Utc;
use salescope_core::data::{clean, load_table, read_table, DataError, RawTable};
use salescope_core::dataset_hash;
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregator::{aggregate, Aggregates};
use crate::config::{AnalysisConfig, ConfigError};
use crate::render::{render_all, ChartStyle, RenderError, RenderOutcome};
use crate::report::{write_summary, AnalysisReport, SCHEMA_VERSION};

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Result of a successful run, including any non-fatal failures.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub charts: RenderOutcome,
    /// Where `summary.json` was written, when it was.
    pub summary_path: Option<std::path::PathBuf>,
    pub summary_error: Option<RenderError>,
}

impl AnalysisOutcome {
    /// Every recovered artifact failure, charts first.
    pub fn non_fatal_errors(&self) -> impl Iterator<Item = &RenderError> {
        self.charts.failures.iter().chain(self.summary_error.as_ref())
    }

    pub fn is_clean(&self) -> bool {
        self.non_fatal_errors().next().is_none()
    }
}

/// Run the full analysis described by `config`.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutcome, RunError> {
    config.validate()?;
    let raw = load_table(&config.input, &config.load_options())?;
    analyze_table(&raw, config)
}

/// Run everything after loading; used when the table comes from memory.
pub fn run_analysis_from_reader<R: std::io::Read>(
    reader: R,
    source_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, RunError> {
    config.validate()?;
    let raw = read_table(reader, source_name, &config.load_options())?;
    analyze_table(&raw, config)
}

fn analyze_table(raw: &RawTable, config: &AnalysisConfig) -> Result<AnalysisOutcome, RunError> {
    let cleaned = clean(raw, config.anomaly_policy);
    let cleaning = cleaned.report;
    if cleaning.dropped_rows() > 0 {
        warn!(
            dropped = cleaning.dropped_rows(),
            total = cleaning.total_rows,
            "rows dropped during cleaning"
        );
    }
    if cleaned.table.is_empty() {
        return Err(DataError::NoValidRows {
            total: cleaning.total_rows,
        }
        .into());
    }

    let hash = dataset_hash(&cleaned.table);
    info!(
        retained = cleaning.retained_rows,
        fingerprint = hash.short(),
        "dataset cleaned"
    );

    let Aggregates { summary, charts: series } =
        aggregate(&cleaned.table, &config.aggregate_options());
    info!(
        categories = summary.categories.len(),
        "aggregation complete"
    );

    let charts = if config.render_charts {
        let style = ChartStyle {
            currency_symbol: config.currency_symbol.clone(),
        };
        render_all(&series, &config.output_dir, &style)
    } else {
        info!("chart rendering disabled");
        RenderOutcome::skipped()
    };

    let report = AnalysisReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        source: raw.source_name.clone(),
        dataset_hash: hash,
        currency_symbol: config.currency_symbol.clone(),
        cleaning,
        summary,
        charts: charts.rendered.clone(),
    };

    let (summary_path, summary_error) = match write_summary(&report, &config.output_dir) {
        Ok(path) => {
            info!(path = %path.display(), "summary written");
            (Some(path), None)
        }
        Err(e) => {
            warn!(error = %e, "summary not written");
            (None, Some(e))
        }
    };

    Ok(AnalysisOutcome {
        report,
        charts,
        summary_path,
        summary_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROWS: &str = "product_id,category,actual_price,discounted_price,rating,rating_count\n\
                            A1,Home|Lamps,100,50,4.0,10\n\
                            A2,Home|Lamps,200,150,4.0,20\n";

    fn config_in(dir: &std::path::Path) -> AnalysisConfig {
        AnalysisConfig {
            output_dir: dir.join("graphs"),
            render_charts: false,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn reader_pipeline_computes_mean_discount() {
        let dir = tempfile::tempdir().unwrap();
        let outcome =
            run_analysis_from_reader(TWO_ROWS.as_bytes(), "inline", &config_in(dir.path())).unwrap();
        let discount = outcome.report.summary.overall.discount_pct.as_ref().unwrap();
        assert_eq!(discount.mean, 37.5);
        assert!(outcome.charts.skipped);
        assert!(outcome.is_clean());
        assert!(outcome.summary_path.unwrap().exists());
    }

    #[test]
    fn huge_review_counts_do_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let text = "product_id,category,actual_price,discounted_price,rating,rating_count\n\
                    A1,Home|Lamps,100,50,4.0,10000000000000000000\n\
                    A2,Home|Lamps,200,150,4.5,10000000000000000000\n";
        let outcome =
            run_analysis_from_reader(text.as_bytes(), "inline", &config_in(dir.path())).unwrap();
        let summary = &outcome.report.summary;
        assert_eq!(summary.overall.total_reviews, u64::MAX);
        assert_eq!(summary.categories[0].total_reviews, u64::MAX);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let config = AnalysisConfig {
            top_n: 0,
            ..AnalysisConfig::default()
        };
        let err = run_analysis_from_reader(TWO_ROWS.as_bytes(), "inline", &config).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn no_valid_rows_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let text = "product_id,category,actual_price,discounted_price,rating,rating_count\n\
                    A1,Home,free,50,4.0,10\n";
        let err =
            run_analysis_from_reader(text.as_bytes(), "inline", &config_in(dir.path())).unwrap_err();
        assert!(matches!(err, RunError::Data(DataError::NoValidRows { total: 1 })));
        assert!(!dir.path().join("graphs").exists());
    }
}

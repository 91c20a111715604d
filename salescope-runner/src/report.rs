//! Reporting: text summary and the `summary.json` artifact.
//!
//! Pure formatting over already-computed numbers. The JSON artifact carries a
//! `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use salescope_core::{CleaningReport, DatasetHash};
use serde::{Deserialize, Serialize};

use crate::aggregator::{AnalysisSummary, FieldSummary};
use crate::pipeline::AnalysisOutcome;
use crate::render::{RenderError, RenderedChart};

/// Current summary schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the JSON artifact inside the output directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Names longer than this are cut and suffixed with `...`.
pub const NAME_WIDTH: usize = 50;

/// Everything persisted about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    /// Dataset path as given.
    pub source: String,
    pub dataset_hash: DatasetHash,
    pub currency_symbol: String,
    pub cleaning: CleaningReport,
    pub summary: AnalysisSummary,
    #[serde(default)]
    pub charts: Vec<RenderedChart>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ─── JSON artifact ──────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Errors from reading a persisted summary.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid summary JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {SCHEMA_VERSION})")]
    UnsupportedVersion { found: u32 },
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisReport, ImportError> {
    let report: AnalysisReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ImportError::UnsupportedVersion {
            found: report.schema_version,
        });
    }
    Ok(report)
}

/// Write `summary.json` into `output_dir`, creating the directory if needed.
pub fn write_summary(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf, RenderError> {
    let path = output_dir.join(SUMMARY_FILE);
    let write_err = |source| RenderError::Write {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(output_dir).map_err(write_err)?;
    let json = export_json(report).map_err(|e| write_err(std::io::Error::other(e)))?;
    std::fs::write(&path, json).map_err(write_err)?;
    Ok(path)
}

// ─── Text report ────────────────────────────────────────────────────

/// Full stdout report for a finished run.
///
/// `category_rows` limits the per-category table.
pub fn format_report(outcome: &AnalysisOutcome, category_rows: usize) -> String {
    let report = &outcome.report;
    let summary = &report.summary;
    let symbol = report.currency_symbol.as_str();
    let mut out = String::new();

    out.push_str("=== Basic Statistics ===\n");
    out.push_str(&format!("Source:           {}\n", report.source));
    out.push_str(&format!("Total products:   {}\n", thousands(summary.record_count as u64)));
    let overall = &summary.overall;
    if let Some(price) = &overall.list_price {
        out.push_str(&format!("Average price:    {}\n", money(price.mean, symbol)));
        out.push_str(&format!("Median price:     {}\n", money(price.median, symbol)));
        out.push_str(&format!(
            "Price range:      {} to {}\n",
            money(price.min, symbol),
            money(price.max, symbol)
        ));
    }
    if let Some(discounted) = &overall.discounted_price {
        out.push_str(&format!("Average paid:     {}\n", money(discounted.mean, symbol)));
    }
    if let Some(discount) = &overall.discount_pct {
        out.push_str(&format!("Average discount: {:.1}%\n", discount.mean));
        out.push_str(&format!("Median discount:  {:.1}%\n", discount.median));
    }
    if let Some(rating) = &overall.rating {
        out.push_str(&format!("Average rating:   {:.2}\n", rating.mean));
    }
    out.push_str(&format!(
        "Rated products:   {}\n",
        thousands(overall.rated_products as u64)
    ));
    out.push_str(&format!("Total reviews:    {}\n", thousands(overall.total_reviews)));

    out.push('\n');
    out.push_str(&format_cleaning(&report.cleaning));

    out.push('\n');
    out.push_str("=== Distributions ===\n");
    out.push_str(&format!(
        "{:<18} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "Field", "Mean", "Std", "Q1", "Median", "Q3"
    ));
    for (name, field) in [
        ("Price", &overall.list_price),
        ("Discounted price", &overall.discounted_price),
        ("Discount %", &overall.discount_pct),
        ("Rating", &overall.rating),
        ("Reviews", &overall.rating_count),
    ] {
        out.push_str(&distribution_row(name, field.as_ref()));
    }

    out.push('\n');
    out.push_str("=== Correlations ===\n");
    let corr = &summary.correlations;
    out.push_str(&format!("Price vs rating:    {}\n", coefficient(corr.price_rating)));
    out.push_str(&format!("Price vs discount:  {}\n", coefficient(corr.price_discount)));
    out.push_str(&format!("Rating vs reviews:  {}\n", coefficient(corr.rating_reviews)));

    out.push('\n');
    out.push_str(&format!(
        "=== Top {} Categories by Average Price ===\n",
        category_rows.min(summary.categories.len())
    ));
    out.push_str(&format!(
        "{:<32} {:>6} {:>12} {:>12} {:>9} {:>7} {:>12}\n",
        "Category", "Items", "Avg price", "Med price", "Discount", "Rating", "Reviews"
    ));
    for cat in summary.categories.iter().take(category_rows) {
        out.push_str(&format!(
            "{:<32} {:>6} {:>12} {:>12} {:>8.1}% {:>7.2} {:>12}\n",
            truncate_chars(&cat.label, 32),
            cat.count,
            money(cat.mean_price, symbol),
            money(cat.median_price, symbol),
            cat.mean_discount_pct,
            cat.mean_rating,
            thousands(cat.total_reviews)
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "=== Top {} Most Reviewed Products ===\n",
        summary.most_reviewed.len()
    ));
    for product in &summary.most_reviewed {
        out.push('\n');
        out.push_str(&format!("Product:  {}\n", truncate_chars(&product.name, NAME_WIDTH)));
        out.push_str(&format!("Category: {}\n", product.category_label));
        out.push_str(&format!(
            "Rating:   {:.1}★ ({} reviews)\n",
            product.rating,
            thousands(product.rating_count)
        ));
        out.push_str(&format!("Price:    {}\n", money(product.price, symbol)));
        out.push_str(&format!("Discount: {:.1}%\n", product.discount_pct));
    }

    out.push('\n');
    out.push_str("=== Artifacts ===\n");
    if outcome.charts.skipped {
        out.push_str("Charts:           skipped\n");
    }
    for chart in &outcome.charts.rendered {
        out.push_str(&format!("Saved:            {}\n", chart.path.display()));
    }
    if let Some(path) = &outcome.summary_path {
        out.push_str(&format!("Saved:            {}\n", path.display()));
    }
    out.push_str(&format!("Fingerprint:      {}\n", report.dataset_hash));

    let issues: Vec<String> = outcome.non_fatal_errors().map(|e| e.to_string()).collect();
    if !issues.is_empty() {
        out.push('\n');
        out.push_str("=== Issues ===\n");
        for issue in issues {
            out.push_str(&format!("WARNING: {issue}\n"));
        }
    }
    out
}

/// Cleaning block: totals, drops by reason, imputations and anomalies.
pub fn format_cleaning(cleaning: &CleaningReport) -> String {
    let mut out = String::from("=== Data Quality ===\n");
    out.push_str(&format!("Rows read:        {}\n", thousands(cleaning.total_rows as u64)));
    out.push_str(&format!(
        "Rows retained:    {}\n",
        thousands(cleaning.retained_rows as u64)
    ));
    out.push_str(&format!(
        "Rows dropped:     {}\n",
        thousands(cleaning.dropped_rows() as u64)
    ));
    for (reason, count) in &cleaning.dropped_by_reason {
        out.push_str(&format!("  - {reason}: {count}\n"));
    }
    out.push_str(&format!(
        "Imputed fields:   {} rating, {} review count\n",
        cleaning.imputed_ratings, cleaning.imputed_rating_counts
    ));
    out.push_str(&format!(
        "Price anomalies:  {} flagged (policy: {})\n",
        cleaning.flagged_anomalies, cleaning.anomaly_policy
    ));
    out
}

fn distribution_row(name: &str, field: Option<&FieldSummary>) -> String {
    match field {
        Some(f) => format!(
            "{:<18} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}\n",
            name, f.mean, f.std_dev, f.q1, f.median, f.q3
        ),
        None => format!("{name:<18} {:>10}\n", "n/a"),
    }
}

fn coefficient(value: Option<f64>) -> String {
    match value {
        Some(r) => format!("{r:>6.3}"),
        None => "   n/a".to_string(),
    }
}

// ─── Formatting helpers ─────────────────────────────────────────────

/// Cut to `max` characters, appending `...` when anything was removed.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// `1234567` → `1,234,567`.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Amount with symbol, thousands separators and two decimals.
pub fn money(amount: f64, symbol: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    format!("{sign}{symbol}{}.{:02}", thousands(cents / 100), cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("₹₹₹₹", 2), "₹₹...");
        let exact = "x".repeat(50);
        assert_eq!(truncate_chars(&exact, 50), exact);
    }

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(313_836), "313,836");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(money(1234.5, "€"), "€1,234.50");
        assert_eq!(money(0.004, "€"), "€0.00");
        assert_eq!(money(-2.5, "$"), "-$2.50");
    }

    #[test]
    fn cleaning_block_lists_reasons() {
        let mut cleaning = CleaningReport {
            total_rows: 5,
            retained_rows: 3,
            imputed_ratings: 1,
            ..CleaningReport::default()
        };
        cleaning
            .dropped_by_reason
            .insert(salescope_core::DropReason::InvalidListPrice, 2);
        let text = format_cleaning(&cleaning);
        assert!(text.contains("Rows dropped:     2"));
        assert!(text.contains("invalid list price: 2"));
        assert!(text.contains("1 rating, 0 review count"));
    }

    fn empty_report() -> AnalysisReport {
        let agg = crate::aggregator::aggregate(
            &salescope_core::CleanTable::default(),
            &crate::aggregator::AggregateOptions::default(),
        );
        AnalysisReport {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            source: "sales.csv".into(),
            dataset_hash: DatasetHash("00".repeat(32)),
            currency_symbol: "€".into(),
            cleaning: CleaningReport::default(),
            summary: agg.summary,
            charts: Vec::new(),
        }
    }

    #[test]
    fn json_round_trip_preserves_report() {
        let report = empty_report();
        let json = export_json(&report).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        assert_eq!(import_json(&json).unwrap(), report);
    }

    #[test]
    fn json_round_trip_keeps_every_float_bit() {
        let mut report = empty_report();
        let awkward = [45.244099999999996, 26.365000000000002, 0.24755111400873087];
        report.summary.conversion_rate = 0.1 + 0.2;
        report.summary.overall.list_price = FieldSummary::compute(&awkward);
        report.summary.correlations.rating_reviews = Some(awkward[2]);
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(back.summary, report.summary);
        let list = back.summary.overall.list_price.unwrap();
        assert_eq!(list.max.to_bits(), awkward[0].to_bits());
        assert_eq!(back.summary.conversion_rate.to_bits(), (0.1_f64 + 0.2).to_bits());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut value = serde_json::to_value(empty_report()).unwrap();
        value["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        let err = import_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedVersion { found } if found == SCHEMA_VERSION + 1));
    }

    #[test]
    fn summary_file_lands_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/graphs");
        let path = write_summary(&empty_report(), &out).unwrap();
        assert_eq!(path, out.join(SUMMARY_FILE));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(import_json(&text).is_ok());
    }
}

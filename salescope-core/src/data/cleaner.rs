//! Row cleaning: coerce raw text fields into `SalesRecord`s.
//!
//! Field policy:
//! - `product_id`, `category`: blank drops the row.
//! - `actual_price`: must parse and be > 0, otherwise the row is dropped.
//! - discounted price: `discounted_price` when parseable, else derived from
//!   `discount_percentage`; neither drops the row.
//! - `rating`: blank/unparseable is imputed as 0; outside [0, 5] drops the row.
//! - `rating_count`: blank/unparseable is imputed as 0; negative or
//!   fractional drops the row.
//!
//! Discounted prices above the list price follow the `AnomalyPolicy`.
//! Every dropped row is recorded, so `retained + dropped == total` always holds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::data::loader::{ColumnMap, RawRow, RawTable};
use crate::data::numeric::{parse_count, parse_decorated, NumericError};
use crate::domain::{discount_pct, SalesRecord};

/// What to do with rows whose discounted price exceeds the list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPolicy {
    /// Drop the row and count it.
    #[default]
    Drop,
    /// Clamp the discounted price to the list price (0% discount) and flag it.
    Clamp,
    /// Keep the row unmodified (negative discount) and flag it.
    Keep,
}

impl fmt::Display for AnomalyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyPolicy::Drop => "drop",
            AnomalyPolicy::Clamp => "clamp",
            AnomalyPolicy::Keep => "keep",
        };
        f.write_str(name)
    }
}

impl FromStr for AnomalyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(AnomalyPolicy::Drop),
            "clamp" => Ok(AnomalyPolicy::Clamp),
            "keep" => Ok(AnomalyPolicy::Keep),
            other => Err(format!(
                "unknown anomaly policy '{other}'. Valid: drop, clamp, keep"
            )),
        }
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingProductId,
    MissingCategory,
    InvalidListPrice,
    InvalidDiscountedPrice,
    RatingOutOfRange,
    InvalidRatingCount,
    PriceAnomaly,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::MissingProductId => "missing product id",
            DropReason::MissingCategory => "missing category",
            DropReason::InvalidListPrice => "invalid list price",
            DropReason::InvalidDiscountedPrice => "invalid discounted price",
            DropReason::RatingOutOfRange => "rating outside [0, 5]",
            DropReason::InvalidRatingCount => "invalid rating count",
            DropReason::PriceAnomaly => "discounted price above list price",
        };
        f.write_str(text)
    }
}

/// A row that could not be coerced. Recovered by dropping the row.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("line {line}: {reason} ({value:?})")]
pub struct RowParseError {
    pub line: usize,
    pub reason: DropReason,
    /// The offending raw value.
    pub value: String,
}

/// Counts describing what the cleaner did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub total_rows: usize,
    pub retained_rows: usize,
    pub dropped_by_reason: BTreeMap<DropReason, usize>,
    /// Blank or unparseable ratings replaced with 0.
    pub imputed_ratings: usize,
    /// Blank or unparseable rating counts replaced with 0.
    pub imputed_rating_counts: usize,
    /// Price anomalies retained under `clamp` or `keep`.
    pub flagged_anomalies: usize,
    pub anomaly_policy: AnomalyPolicy,
    pub issues: Vec<RowParseError>,
}

impl CleaningReport {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_by_reason.values().sum()
    }

    /// `retained + dropped == total`.
    pub fn is_balanced(&self) -> bool {
        self.retained_rows + self.dropped_rows() == self.total_rows
    }

    fn record_drop(&mut self, issue: RowParseError) {
        *self.dropped_by_reason.entry(issue.reason).or_insert(0) += 1;
        self.issues.push(issue);
    }
}

/// Cleaned, read-only table of records in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    records: Vec<SalesRecord>,
}

impl CleanTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }
}

/// Output of the cleaning stage.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: CleanTable,
    pub report: CleaningReport,
}

/// Per-row result before it is folded into the report.
struct RowOutcome {
    record: SalesRecord,
    imputed_rating: bool,
    imputed_count: bool,
    flagged: bool,
}

/// Clean every row of a raw table.
pub fn clean(raw: &RawTable, policy: AnomalyPolicy) -> Cleaned {
    let mut report = CleaningReport {
        total_rows: raw.len(),
        anomaly_policy: policy,
        ..CleaningReport::default()
    };
    let mut records = Vec::with_capacity(raw.len());

    for row in &raw.rows {
        match clean_row(row, &raw.columns, policy) {
            Ok(outcome) => {
                report.imputed_ratings += usize::from(outcome.imputed_rating);
                report.imputed_rating_counts += usize::from(outcome.imputed_count);
                report.flagged_anomalies += usize::from(outcome.flagged);
                records.push(outcome.record);
            }
            Err(issue) => {
                debug!(line = issue.line, reason = %issue.reason, value = %issue.value, "row dropped");
                report.record_drop(issue);
            }
        }
    }

    report.retained_rows = records.len();
    Cleaned {
        table: CleanTable::new(records),
        report,
    }
}

fn clean_row(
    row: &RawRow,
    cols: &ColumnMap,
    policy: AnomalyPolicy,
) -> Result<RowOutcome, RowParseError> {
    let fail = |reason: DropReason, value: &str| RowParseError {
        line: row.line,
        reason,
        value: value.trim().to_string(),
    };

    let product_id = row.field(cols.product_id).trim();
    if product_id.is_empty() {
        return Err(fail(DropReason::MissingProductId, product_id));
    }

    let category = row.field(cols.category).trim();
    if category.is_empty() {
        return Err(fail(DropReason::MissingCategory, category));
    }

    let raw_list = row.field(cols.actual_price);
    let list_price = parse_decorated(raw_list)
        .ok()
        .filter(|p| *p > 0.0)
        .ok_or_else(|| fail(DropReason::InvalidListPrice, raw_list))?;

    let mut discounted_price = resolve_discounted_price(row, cols, list_price).ok_or_else(|| {
        let raw = cols
            .discounted_price
            .or(cols.discount_percentage)
            .map(|i| row.field(i))
            .unwrap_or("");
        fail(DropReason::InvalidDiscountedPrice, raw)
    })?;

    let mut flagged = false;
    if discounted_price > list_price {
        match policy {
            AnomalyPolicy::Drop => {
                let value = format!("{discounted_price} > {list_price}");
                return Err(fail(DropReason::PriceAnomaly, &value));
            }
            AnomalyPolicy::Clamp => {
                discounted_price = list_price;
                flagged = true;
            }
            AnomalyPolicy::Keep => flagged = true,
        }
    }

    let raw_rating = row.field(cols.rating);
    let (rating, imputed_rating) = match parse_decorated(raw_rating) {
        Ok(r) if (0.0..=5.0).contains(&r) => (r, false),
        Ok(_) => return Err(fail(DropReason::RatingOutOfRange, raw_rating)),
        Err(_) => (0.0, true),
    };

    let raw_count = row.field(cols.rating_count);
    let (rating_count, imputed_count) = match parse_count(raw_count) {
        Ok(n) => (n, false),
        Err(NumericError::OutOfRange(_)) => {
            return Err(fail(DropReason::InvalidRatingCount, raw_count))
        }
        Err(_) => (0, true),
    };

    let product_name = cols
        .product_name
        .map(|i| row.field(i).trim().to_string())
        .unwrap_or_default();

    Ok(RowOutcome {
        record: SalesRecord {
            line: row.line,
            product_id: product_id.to_string(),
            product_name,
            category: category.to_string(),
            list_price,
            discounted_price,
            discount_pct: discount_pct(list_price, discounted_price),
            rating,
            rating_count,
        },
        imputed_rating,
        imputed_count,
        flagged,
    })
}

/// Discounted price from the explicit column, falling back to the percentage.
fn resolve_discounted_price(row: &RawRow, cols: &ColumnMap, list_price: f64) -> Option<f64> {
    let explicit = cols
        .discounted_price
        .and_then(|i| parse_decorated(row.field(i)).ok())
        .filter(|p| *p >= 0.0);

    explicit.or_else(|| {
        cols.discount_percentage
            .and_then(|i| parse_decorated(row.field(i)).ok())
            .filter(|pct| (0.0..=100.0).contains(pct))
            .map(|pct| list_price * (1.0 - pct / 100.0))
    })
}

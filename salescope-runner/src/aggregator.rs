//! Aggregation: pure summary statistics over a cleaned table.
//!
//! Produces two things from one pass over the records:
//! - `AnalysisSummary`: the numbers that end up in the text report and
//!   `summary.json`
//! - `ChartSeries`: the plotted series consumed by the renderer
//!
//! Prices are converted to the display currency here; nothing downstream
//! multiplies by the conversion rate again.

use std::collections::BTreeMap;

use salescope_core::data::CleanTable;
use salescope_core::domain::{category_leaf, SalesRecord};
use salescope_core::stats::{median, pearson, Histogram, Quartiles, RunningStats};
use serde::{Deserialize, Serialize};

/// Rating histogram covers [0, 5] in 0.1 steps.
const RATING_BIN_WIDTH: f64 = 0.1;
const RATING_BINS: usize = 50;

/// Knobs for `aggregate`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub top_n: usize,
    pub chart_top_k: usize,
    pub price_bins: usize,
    pub conversion_rate: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            chart_top_k: 15,
            price_bins: 50,
            conversion_rate: 0.011,
        }
    }
}

// ─── Summary types ──────────────────────────────────────────────────

/// Descriptive statistics for one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1); 0 for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FieldSummary {
    /// `None` for an empty slice.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let stats: RunningStats = values.iter().copied().collect();
        let quartiles = Quartiles::compute(values)?;
        Some(Self {
            count: stats.count(),
            mean: stats.mean()?,
            std_dev: stats.std_dev(),
            min: stats.min()?,
            q1: quartiles.q1,
            median: quartiles.median,
            q3: quartiles.q3,
            max: stats.max()?,
        })
    }
}

/// Table-wide statistics. Prices are in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub list_price: Option<FieldSummary>,
    pub discounted_price: Option<FieldSummary>,
    pub discount_pct: Option<FieldSummary>,
    /// All ratings, unrated products counted as 0.
    pub rating: Option<FieldSummary>,
    /// Products with a rating above 0.
    pub rated_products: usize,
    pub rating_count: Option<FieldSummary>,
    /// Saturates at `u64::MAX`.
    pub total_reviews: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Full `|`-separated path; the grouping key.
    pub category: String,
    /// Leaf segment, for display.
    pub label: String,
    pub count: usize,
    pub mean_price: f64,
    pub median_price: f64,
    pub mean_discount_pct: f64,
    pub median_discount_pct: f64,
    pub mean_rating: f64,
    pub median_rating: f64,
    pub total_reviews: u64,
}

/// Pairwise Pearson correlations; `None` where undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlations {
    pub price_rating: Option<f64>,
    pub price_discount: Option<f64>,
    pub rating_reviews: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub rank: usize,
    pub product_id: String,
    pub name: String,
    pub category_label: String,
    pub rating: f64,
    pub rating_count: u64,
    /// List price in the display currency.
    pub price: f64,
    pub discount_pct: f64,
}

/// Everything the reporter prints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub record_count: usize,
    pub conversion_rate: f64,
    pub overall: OverallStats,
    /// Sorted by mean price descending, ties by category path.
    pub categories: Vec<CategoryStats>,
    pub correlations: Correlations,
    /// Top-N by rating count, ties in source order.
    pub most_reviewed: Vec<TopProduct>,
}

// ─── Chart series ───────────────────────────────────────────────────

/// One labelled horizontal bar.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBar {
    pub label: String,
    pub value: f64,
}

/// One product in a scatter plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductPoint {
    pub price: f64,
    pub discount_pct: f64,
    pub rating: f64,
    pub rating_count: u64,
}

/// Renderer input.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub price_histogram: Option<Histogram>,
    /// Rated products only.
    pub rating_histogram: Histogram,
    pub top_categories_by_price: Vec<CategoryBar>,
    pub top_categories_by_discount: Vec<CategoryBar>,
    pub top_reviewed: Vec<TopProduct>,
    pub points: Vec<ProductPoint>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Output of `aggregate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub summary: AnalysisSummary,
    pub charts: ChartSeries,
}

// ─── Aggregation ────────────────────────────────────────────────────

/// Compute every summary and chart series for a cleaned table.
///
/// Total over any table, including an empty one (all field summaries are
/// `None`, every list is empty).
pub fn aggregate(table: &CleanTable, opts: &AggregateOptions) -> Aggregates {
    let records = table.records();
    let rate = opts.conversion_rate;

    let prices: Vec<f64> = records.iter().map(|r| r.list_price * rate).collect();
    let discounted: Vec<f64> = records.iter().map(|r| r.discounted_price * rate).collect();
    let discounts: Vec<f64> = records.iter().map(|r| r.discount_pct).collect();
    let ratings: Vec<f64> = records.iter().map(|r| r.rating).collect();
    let counts: Vec<f64> = records.iter().map(|r| r.rating_count as f64).collect();
    let rated: Vec<f64> = records
        .iter()
        .filter(|r| r.is_rated())
        .map(|r| r.rating)
        .collect();

    let overall = OverallStats {
        list_price: FieldSummary::compute(&prices),
        discounted_price: FieldSummary::compute(&discounted),
        discount_pct: FieldSummary::compute(&discounts),
        rating: FieldSummary::compute(&ratings),
        rated_products: rated.len(),
        rating_count: FieldSummary::compute(&counts),
        total_reviews: records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.rating_count)),
    };

    let correlations = Correlations {
        price_rating: pearson(&prices, &ratings),
        price_discount: pearson(&prices, &discounts),
        rating_reviews: pearson(&ratings, &counts),
    };

    let categories = category_stats(records, rate);
    let ranked = most_reviewed(records, opts.top_n.max(opts.chart_top_k), rate);

    let charts = ChartSeries {
        price_histogram: Histogram::log_spaced(&prices, opts.price_bins),
        rating_histogram: Histogram::with_edges(&rated, 0.0, RATING_BIN_WIDTH, RATING_BINS),
        top_categories_by_price: categories
            .iter()
            .take(opts.chart_top_k)
            .map(|c| CategoryBar {
                label: c.label.clone(),
                value: c.mean_price,
            })
            .collect(),
        top_categories_by_discount: top_by_discount(&categories, opts.chart_top_k),
        top_reviewed: ranked.iter().take(opts.chart_top_k).cloned().collect(),
        points: records
            .iter()
            .zip(&prices)
            .map(|(r, &price)| ProductPoint {
                price,
                discount_pct: r.discount_pct,
                rating: r.rating,
                rating_count: r.rating_count,
            })
            .collect(),
    };

    let summary = AnalysisSummary {
        record_count: records.len(),
        conversion_rate: rate,
        overall,
        categories,
        correlations,
        most_reviewed: ranked.into_iter().take(opts.top_n).collect(),
    };

    Aggregates { summary, charts }
}

#[derive(Default)]
struct CategoryAccumulator {
    prices: Vec<f64>,
    discounts: Vec<f64>,
    ratings: Vec<f64>,
    reviews: u64,
}

/// Mean and median of a non-empty group.
fn centre(values: &[f64]) -> (f64, f64) {
    let stats: RunningStats = values.iter().copied().collect();
    (
        stats.mean().unwrap_or(0.0),
        median(values).unwrap_or(0.0),
    )
}

/// Per-category statistics, sorted by mean price descending then path.
pub fn category_stats(records: &[SalesRecord], rate: f64) -> Vec<CategoryStats> {
    let mut groups: BTreeMap<&str, CategoryAccumulator> = BTreeMap::new();
    for r in records {
        let acc = groups.entry(r.category.as_str()).or_default();
        acc.prices.push(r.list_price * rate);
        acc.discounts.push(r.discount_pct);
        acc.ratings.push(r.rating);
        acc.reviews = acc.reviews.saturating_add(r.rating_count);
    }

    let mut stats: Vec<CategoryStats> = groups
        .into_iter()
        .map(|(category, acc)| {
            let (mean_price, median_price) = centre(&acc.prices);
            let (mean_discount_pct, median_discount_pct) = centre(&acc.discounts);
            let (mean_rating, median_rating) = centre(&acc.ratings);
            CategoryStats {
                category: category.to_string(),
                label: category_leaf(category).to_string(),
                count: acc.prices.len(),
                mean_price,
                median_price,
                mean_discount_pct,
                median_discount_pct,
                mean_rating,
                median_rating,
                total_reviews: acc.reviews,
            }
        })
        .collect();

    // BTreeMap iteration is already path-ordered, so a stable sort on price
    // keeps ties alphabetical.
    stats.sort_by(|a, b| b.mean_price.total_cmp(&a.mean_price));
    stats
}

fn top_by_discount(categories: &[CategoryStats], k: usize) -> Vec<CategoryBar> {
    let mut by_discount: Vec<&CategoryStats> = categories.iter().collect();
    by_discount.sort_by(|a, b| {
        b.mean_discount_pct
            .total_cmp(&a.mean_discount_pct)
            .then_with(|| a.category.cmp(&b.category))
    });
    by_discount
        .into_iter()
        .take(k)
        .map(|c| CategoryBar {
            label: c.label.clone(),
            value: c.mean_discount_pct,
        })
        .collect()
}

/// Top `n` products by rating count; ties keep source order.
pub fn most_reviewed(records: &[SalesRecord], n: usize, rate: f64) -> Vec<TopProduct> {
    let mut order: Vec<&SalesRecord> = records.iter().collect();
    order.sort_by(|a, b| b.rating_count.cmp(&a.rating_count));
    order
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, r)| TopProduct {
            rank: i + 1,
            product_id: r.product_id.clone(),
            name: r.display_name().to_string(),
            category_label: r.category_leaf().to_string(),
            rating: r.rating,
            rating_count: r.rating_count,
            price: r.list_price * rate,
            discount_pct: r.discount_pct,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize, category: &str, list: f64, discounted: f64, rating: f64, count: u64) -> SalesRecord {
        SalesRecord {
            line,
            product_id: format!("P{line}"),
            product_name: format!("Product {line}"),
            category: category.to_string(),
            list_price: list,
            discounted_price: discounted,
            discount_pct: salescope_core::domain::discount_pct(list, discounted),
            rating,
            rating_count: count,
        }
    }

    fn unit_rate() -> AggregateOptions {
        AggregateOptions {
            conversion_rate: 1.0,
            ..AggregateOptions::default()
        }
    }

    #[test]
    fn mean_discount_of_two_rows() {
        let table = CleanTable::new(vec![
            record(2, "A", 100.0, 50.0, 4.0, 10),
            record(3, "A", 200.0, 150.0, 4.0, 10),
        ]);
        let agg = aggregate(&table, &unit_rate());
        let discount = agg.summary.overall.discount_pct.unwrap();
        assert_eq!(discount.mean, 37.5);
        assert_eq!(discount.count, 2);
    }

    #[test]
    fn identical_ratings_have_exact_mean() {
        let records = (0..7).map(|i| record(i + 2, "A", 10.0, 5.0, 4.3, 1)).collect();
        let agg = aggregate(&CleanTable::new(records), &unit_rate());
        let rating = agg.summary.overall.rating.unwrap();
        assert_eq!(rating.mean, 4.3);
        assert_eq!(rating.median, 4.3);
        assert_eq!(rating.std_dev, 0.0);
    }

    #[test]
    fn prices_are_converted() {
        let table = CleanTable::new(vec![record(2, "A", 1000.0, 500.0, 4.0, 1)]);
        let agg = aggregate(&table, &AggregateOptions::default());
        let price = agg.summary.overall.list_price.unwrap();
        assert!((price.mean - 11.0).abs() < 1e-9);
        assert!((agg.summary.most_reviewed[0].price - 11.0).abs() < 1e-9);
        // Discounts are currency-free.
        assert_eq!(agg.summary.overall.discount_pct.unwrap().mean, 50.0);
    }

    #[test]
    fn categories_sorted_by_price_then_name() {
        let table = CleanTable::new(vec![
            record(2, "Home|Lamps", 50.0, 40.0, 4.0, 1),
            record(3, "Tech|Phones", 300.0, 200.0, 4.0, 1),
            record(4, "Home|Chairs", 50.0, 25.0, 3.0, 1),
            record(5, "Tech|Phones", 100.0, 90.0, 5.0, 3),
        ]);
        let cats = category_stats(table.records(), 1.0);
        let order: Vec<&str> = cats.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, ["Tech|Phones", "Home|Chairs", "Home|Lamps"]);
        assert_eq!(cats[0].label, "Phones");
        assert_eq!(cats[0].count, 2);
        assert_eq!(cats[0].mean_price, 200.0);
        assert_eq!(cats[0].total_reviews, 4);
    }

    #[test]
    fn category_medians_resist_outliers() {
        let table = CleanTable::new(vec![
            record(2, "Tech|Cables", 10.0, 9.0, 4.0, 1),
            record(3, "Tech|Cables", 20.0, 10.0, 4.5, 1),
            record(4, "Tech|Cables", 30.0, 15.0, 3.0, 1),
            record(5, "Tech|Cables", 940.0, 470.0, 5.0, 1),
        ]);
        let cats = category_stats(table.records(), 1.0);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].mean_price, 250.0);
        assert_eq!(cats[0].median_price, 25.0);
        assert_eq!(cats[0].median_discount_pct, 50.0);
        assert_eq!(cats[0].median_rating, 4.25);
    }

    #[test]
    fn review_totals_saturate_instead_of_overflowing() {
        let huge = 10_000_000_000_000_000_000;
        let table = CleanTable::new(vec![
            record(2, "A|x", 10.0, 5.0, 4.0, huge),
            record(3, "A|x", 20.0, 5.0, 4.0, huge),
        ]);
        let agg = aggregate(&table, &unit_rate());
        assert_eq!(agg.summary.overall.total_reviews, u64::MAX);
        assert_eq!(agg.summary.categories[0].total_reviews, u64::MAX);
        assert_eq!(agg.summary.most_reviewed[0].rating_count, huge);
    }

    #[test]
    fn price_histogram_uses_log_buckets() {
        let records = [10.0, 12.0, 100.0, 120.0, 1000.0, 10_000.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| record(i + 2, "A", p, p / 2.0, 4.0, 1))
            .collect();
        let opts = AggregateOptions {
            price_bins: 3,
            ..unit_rate()
        };
        let agg = aggregate(&CleanTable::new(records), &opts);
        let hist = agg.charts.price_histogram.unwrap();
        let counts: Vec<usize> = hist.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, [2, 2, 2]);
        assert_eq!(hist.bins[0].lower, 10.0);
        assert_eq!(hist.bins[2].upper, 10_000.0);
    }

    #[test]
    fn discount_bars_rank_by_discount() {
        let table = CleanTable::new(vec![
            record(2, "A|Low", 100.0, 90.0, 4.0, 1),
            record(3, "A|High", 100.0, 20.0, 4.0, 1),
        ]);
        let agg = aggregate(&table, &unit_rate());
        assert_eq!(agg.charts.top_categories_by_discount[0].label, "High");
        assert_eq!(agg.charts.top_categories_by_discount[0].value, 80.0);
    }

    #[test]
    fn most_reviewed_ties_keep_source_order() {
        let records = vec![
            record(2, "A", 10.0, 5.0, 4.0, 7),
            record(3, "A", 10.0, 5.0, 4.0, 9),
            record(4, "A", 10.0, 5.0, 4.0, 7),
            record(5, "A", 10.0, 5.0, 4.0, 1),
        ];
        let top = most_reviewed(&records, 3, 1.0);
        let ids: Vec<&str> = top.iter().map(|t| t.product_id.as_str()).collect();
        assert_eq!(ids, ["P3", "P2", "P4"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].rank, 3);
    }

    #[test]
    fn top_n_limits_report_but_not_charts() {
        let records = (0..20).map(|i| record(i + 2, "A", 10.0, 5.0, 4.0, i as u64)).collect();
        let opts = AggregateOptions {
            top_n: 3,
            chart_top_k: 10,
            ..unit_rate()
        };
        let agg = aggregate(&CleanTable::new(records), &opts);
        assert_eq!(agg.summary.most_reviewed.len(), 3);
        assert_eq!(agg.charts.top_reviewed.len(), 10);
    }

    #[test]
    fn rating_histogram_excludes_unrated() {
        let table = CleanTable::new(vec![
            record(2, "A", 10.0, 5.0, 0.0, 0),
            record(3, "A", 10.0, 5.0, 4.3, 5),
            record(4, "A", 10.0, 5.0, 5.0, 5),
        ]);
        let agg = aggregate(&table, &unit_rate());
        let hist = &agg.charts.rating_histogram;
        assert_eq!(hist.bins.len(), 50);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.bins[43].count, 1);
        assert_eq!(hist.bins[49].count, 1);
        assert_eq!(agg.summary.overall.rated_products, 2);
    }

    #[test]
    fn correlations_need_variance() {
        let table = CleanTable::new(vec![
            record(2, "A", 100.0, 50.0, 4.0, 1),
            record(3, "A", 200.0, 100.0, 4.0, 2),
        ]);
        let agg = aggregate(&table, &unit_rate());
        // Constant rating and constant discount.
        assert_eq!(agg.summary.correlations.price_rating, None);
        assert_eq!(agg.summary.correlations.price_discount, None);
        assert_eq!(agg.summary.correlations.rating_reviews, None);
    }

    #[test]
    fn empty_table_aggregates_to_nothing() {
        let agg = aggregate(&CleanTable::default(), &AggregateOptions::default());
        assert_eq!(agg.summary.record_count, 0);
        assert!(agg.summary.overall.list_price.is_none());
        assert!(agg.summary.categories.is_empty());
        assert!(agg.charts.price_histogram.is_none());
        assert!(agg.charts.is_empty());
    }

    #[test]
    fn aggregation_is_deterministic() {
        let records: Vec<SalesRecord> = (0..30)
            .map(|i| {
                let list = 100.0 + i as f64 * 13.0;
                record(i + 2, ["A|x", "B|y", "C|z"][i % 3], list, list * 0.7, (i % 5) as f64, i as u64)
            })
            .collect();
        let table = CleanTable::new(records);
        let opts = AggregateOptions::default();
        assert_eq!(aggregate(&table, &opts), aggregate(&table, &opts));
    }
}

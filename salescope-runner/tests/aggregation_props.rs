//! Property tests for aggregation invariants.

use proptest::prelude::*;
use salescope_core::data::CleanTable;
use salescope_core::domain::{discount_pct, SalesRecord};
use salescope_runner::{aggregate, AggregateOptions};

fn arb_record() -> impl Strategy<Value = (u8, f64, f64, u8, u64)> {
    (
        0u8..6,
        10.0..50_000.0_f64,
        0.0..=1.0_f64,
        0u8..=50,
        0u64..500_000,
    )
}

fn build(rows: &[(u8, f64, f64, u8, u64)]) -> CleanTable {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, &(cat, list, paid_share, rating, count))| {
            let list = (list * 100.0).round() / 100.0;
            let discounted = (list * paid_share * 100.0).round() / 100.0;
            SalesRecord {
                line: i + 2,
                product_id: format!("P{i}"),
                product_name: String::new(),
                category: format!("Root|Cat{cat}"),
                list_price: list,
                discounted_price: discounted,
                discount_pct: discount_pct(list, discounted),
                rating: rating as f64 / 10.0,
                rating_count: count,
            }
        })
        .collect();
    CleanTable::new(records)
}

proptest! {
    #[test]
    fn category_counts_cover_every_record(rows in prop::collection::vec(arb_record(), 1..120)) {
        let table = build(&rows);
        let agg = aggregate(&table, &AggregateOptions::default());
        let summary = &agg.summary;

        prop_assert_eq!(summary.record_count, rows.len());
        prop_assert_eq!(summary.categories.iter().map(|c| c.count).sum::<usize>(), rows.len());
        prop_assert!(summary
            .categories
            .windows(2)
            .all(|w| w[0].mean_price >= w[1].mean_price));
    }

    #[test]
    fn most_reviewed_is_sorted_and_bounded(
        rows in prop::collection::vec(arb_record(), 1..120),
        top_n in 1usize..20,
    ) {
        let table = build(&rows);
        let opts = AggregateOptions { top_n, ..AggregateOptions::default() };
        let top = aggregate(&table, &opts).summary.most_reviewed;

        prop_assert_eq!(top.len(), top_n.min(rows.len()));
        prop_assert!(top.windows(2).all(|w| w[0].rating_count >= w[1].rating_count));
        let max = rows.iter().map(|r| r.4).max().unwrap();
        prop_assert_eq!(top[0].rating_count, max);
    }

    #[test]
    fn correlations_are_bounded(rows in prop::collection::vec(arb_record(), 2..120)) {
        let agg = aggregate(&build(&rows), &AggregateOptions::default());
        let c = agg.summary.correlations;
        for r in [c.price_rating, c.price_discount, c.rating_reviews].into_iter().flatten() {
            prop_assert!((-1.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn rated_histogram_counts_rated_products(rows in prop::collection::vec(arb_record(), 1..120)) {
        let agg = aggregate(&build(&rows), &AggregateOptions::default());
        let rated = rows.iter().filter(|r| r.3 > 0).count();
        prop_assert_eq!(agg.charts.rating_histogram.total(), rated);
        prop_assert_eq!(agg.summary.overall.rated_products, rated);
    }
}

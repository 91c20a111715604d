//! Sales record: one cleaned product listing.

use serde::{Deserialize, Serialize};

/// Separator between levels of a category path.
pub const CATEGORY_SEPARATOR: char = '|';

/// A single product listing after cleaning.
///
/// Prices are in the dataset's source currency. Records are built once by the
/// cleaner and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub product_id: String,
    /// Empty when the dataset has no `product_name` column.
    pub product_name: String,
    /// Full `|`-separated category path.
    pub category: String,
    pub list_price: f64,
    pub discounted_price: f64,
    /// (list − discounted) / list × 100, rounded to 2 decimals.
    pub discount_pct: f64,
    /// Average rating in [0, 5]. Zero means unrated.
    pub rating: f64,
    pub rating_count: u64,
}

impl SalesRecord {
    /// Last segment of the category path, used for chart and report labels.
    pub fn category_leaf(&self) -> &str {
        category_leaf(&self.category)
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0.0
    }

    /// True when the discounted price does not exceed the list price.
    pub fn is_price_consistent(&self) -> bool {
        self.discounted_price <= self.list_price
    }

    /// Display name: product name when present, otherwise the product id.
    pub fn display_name(&self) -> &str {
        if self.product_name.is_empty() {
            &self.product_id
        } else {
            &self.product_name
        }
    }
}

/// Last segment of a `|`-separated category path.
pub fn category_leaf(category: &str) -> &str {
    category
        .rsplit(CATEGORY_SEPARATOR)
        .next()
        .unwrap_or(category)
        .trim()
}

/// Discount percentage from a list and discounted price, rounded to 2 decimals.
///
/// Returns 0.0 for a non-positive list price.
pub fn discount_pct(list_price: f64, discounted_price: f64) -> f64 {
    if list_price <= 0.0 {
        return 0.0;
    }
    round2((list_price - discounted_price) / list_price * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Domain types for SaleScope

pub mod record;

pub use record::{category_leaf, discount_pct, SalesRecord, CATEGORY_SEPARATOR};

//! Dataset fingerprinting: deterministic identity of a cleaned table.
//!
//! Two runs over the same input produce the same `DatasetHash`, which makes
//! summaries from different runs comparable at a glance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::CleanTable;

/// BLAKE3 hex digest of a cleaned dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    /// Abbreviated form for console output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash every record field in source order.
///
/// Strings are length-prefixed so adjacent fields cannot alias; floats are
/// hashed by their little-endian bit pattern.
pub fn dataset_hash(table: &CleanTable) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(table.len() as u64).to_le_bytes());

    for record in table.iter() {
        hasher.update(&(record.line as u64).to_le_bytes());
        for text in [&record.product_id, &record.product_name, &record.category] {
            hasher.update(&(text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        hasher.update(&record.list_price.to_le_bytes());
        hasher.update(&record.discounted_price.to_le_bytes());
        hasher.update(&record.discount_pct.to_le_bytes());
        hasher.update(&record.rating.to_le_bytes());
        hasher.update(&record.rating_count.to_le_bytes());
    }

    DatasetHash(hasher.finalize().to_hex().to_string())
}

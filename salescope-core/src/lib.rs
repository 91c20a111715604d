//! SaleScope Core: domain types, dataset loading, cleaning, and statistics.
//!
//! This crate holds the data side of the analysis pipeline:
//! - `SalesRecord`, the cleaned product listing
//! - Loader: delimited file → `RawTable` (structure checks only)
//! - Cleaner: `RawTable` → `CleanTable` + `CleaningReport`
//! - Pure statistics (running mean/std, quantiles, Pearson, histograms)
//! - BLAKE3 dataset fingerprint

pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod stats;

pub use data::{
    clean, load_table, read_table, AnomalyPolicy, CleanTable, Cleaned, CleaningReport, DataError,
    DropReason, LoadOptions, RawTable, RowParseError,
};
pub use domain::SalesRecord;
pub use fingerprint::{dataset_hash, DatasetHash};

//! Dataset loading and cleaning

pub mod cleaner;
pub mod loader;
pub mod numeric;

pub use cleaner::{
    clean, AnomalyPolicy, CleanTable, Cleaned, CleaningReport, DropReason, RowParseError,
};
pub use loader::{load_table, read_table, ColumnMap, DataError, LoadOptions, RawRow, RawTable};
pub use numeric::{parse_count, parse_decorated, NumericError};

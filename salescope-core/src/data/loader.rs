//! Dataset loading: delimited text file into a raw, uncoerced table.
//!
//! The loader only checks structure: the file exists, has a header and at
//! least one data row, and carries every required column. Field values are
//! kept as text; coercion is the cleaner's job.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub const COL_PRODUCT_ID: &str = "product_id";
pub const COL_PRODUCT_NAME: &str = "product_name";
pub const COL_CATEGORY: &str = "category";
pub const COL_ACTUAL_PRICE: &str = "actual_price";
pub const COL_DISCOUNTED_PRICE: &str = "discounted_price";
pub const COL_DISCOUNT_PERCENTAGE: &str = "discount_percentage";
pub const COL_RATING: &str = "rating";
pub const COL_RATING_COUNT: &str = "rating_count";

/// Columns that must always be present.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_PRODUCT_ID,
    COL_CATEGORY,
    COL_ACTUAL_PRICE,
    COL_RATING,
    COL_RATING_COUNT,
];

/// Fatal errors from loading or validating the dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("dataset not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to open dataset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read dataset {source_name}: {source}")]
    Read {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("dataset {source_name} is empty (no header or no data rows)")]
    Empty { source_name: String },

    #[error("dataset is missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("no valid rows: all {total} row(s) were dropped during cleaning")]
    NoValidRows { total: usize },
}

/// Options controlling how the dataset is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Positions of the columns the cleaner reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub product_id: usize,
    pub product_name: Option<usize>,
    pub category: usize,
    pub actual_price: usize,
    pub discounted_price: Option<usize>,
    pub discount_percentage: Option<usize>,
    pub rating: usize,
    pub rating_count: usize,
}

impl ColumnMap {
    /// Resolve column positions from header names (trimmed, case-insensitive).
    ///
    /// At least one of `discounted_price` / `discount_percentage` must exist.
    pub fn resolve(headers: &[String]) -> Result<Self, DataError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);

        let mut missing: Vec<String> = Vec::new();
        let mut required = |name: &str| {
            let index = find(name);
            if index.is_none() {
                missing.push(name.to_string());
            }
            index
        };
        let product_id = required(COL_PRODUCT_ID);
        let category = required(COL_CATEGORY);
        let actual_price = required(COL_ACTUAL_PRICE);
        let rating = required(COL_RATING);
        let rating_count = required(COL_RATING_COUNT);

        let discounted_price = find(COL_DISCOUNTED_PRICE);
        let discount_percentage = find(COL_DISCOUNT_PERCENTAGE);
        if discounted_price.is_none() && discount_percentage.is_none() {
            missing.push(format!("{COL_DISCOUNTED_PRICE} or {COL_DISCOUNT_PERCENTAGE}"));
        }

        let (Some(product_id), Some(category), Some(actual_price), Some(rating), Some(rating_count)) =
            (product_id, category, actual_price, rating, rating_count)
        else {
            return Err(DataError::MissingColumns { missing });
        };
        if !missing.is_empty() {
            return Err(DataError::MissingColumns { missing });
        }

        Ok(Self {
            product_id,
            product_name: find(COL_PRODUCT_NAME),
            category,
            actual_price,
            discounted_price,
            discount_percentage,
            rating,
            rating_count,
        })
    }
}

/// One data row, fields still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source.
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    /// Field at `index`, or `""` for short rows.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }
}

/// The dataset as read from disk.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source_name: String,
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a dataset file from disk.
pub fn load_table(path: &Path, opts: &LoadOptions) -> Result<RawTable, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table(file, &path.display().to_string(), opts)?;
    info!(
        source = %table.source_name,
        rows = table.len(),
        columns = table.headers.len(),
        "dataset loaded"
    );
    Ok(table)
}

/// Read a dataset from any reader. `source_name` labels errors and logs.
pub fn read_table<R: Read>(
    reader: R,
    source_name: &str,
    opts: &LoadOptions,
) -> Result<RawTable, DataError> {
    let read_err = |source: csv::Error| DataError::Read {
        source_name: source_name.to_string(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(read_err)?
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataError::Empty {
            source_name: source_name.to_string(),
        });
    }

    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.byte_records().enumerate() {
        let record = record.map_err(read_err)?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);
        let fields = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        rows.push(RawRow { line, fields });
    }

    if rows.is_empty() {
        return Err(DataError::Empty {
            source_name: source_name.to_string(),
        });
    }

    Ok(RawTable {
        source_name: source_name.to_string(),
        headers,
        columns,
        rows,
    })
}

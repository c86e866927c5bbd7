use std::io;

use thiserror::Error;

use crate::ValueError;

/// Errors that can arise when reading or constructing a `DataMatrix`
#[derive(Debug, Error)]
pub enum FormatError {
    /// Problem reading the file
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// There was no `category_counts:` header
    #[error("no 'category_counts:' header")]
    MissingCategoryCounts,
    /// A header appeared more than once
    #[error("duplicate '{header}:' header on line {line_ix}")]
    DuplicateHeader { header: String, line_ix: usize },
    /// A header line could not be parsed
    #[error("could not parse '{token}' in header on line {line_ix}")]
    InvalidHeader { line_ix: usize, token: String },
    /// A category count of one is neither continuous nor a useful category,
    /// and counts above `MAX_CATEGORIES` are not supported
    #[error(
        "column {col_ix} declares {count} categories; use 0 for continuous \
         or 2 to {} for categorical",
        crate::MAX_CATEGORIES
    )]
    InvalidCategoryCount { col_ix: usize, count: usize },
    /// The `features:` header and `category_counts:` header disagree
    #[error("{n_names} feature names given for {n_cols} columns")]
    FeatureCountMismatch { n_names: usize, n_cols: usize },
    /// A row has the wrong number of entries
    #[error("row {row_ix} has {n_values} values, but there are {n_cols} columns")]
    RowLengthMismatch {
        row_ix: usize,
        n_cols: usize,
        n_values: usize,
    },
    /// The flat value buffer does not hold `n_rows * n_cols` entries
    #[error("{n_values} values given for {n_rows} rows of {n_cols} columns")]
    ShapeMismatch {
        n_rows: usize,
        n_cols: usize,
        n_values: usize,
    },
    /// A matrix entry is not a number
    #[error("could not parse '{token}' in row {row_ix}, column {col_ix}")]
    NonNumeric {
        row_ix: usize,
        col_ix: usize,
        token: String,
    },
    /// A matrix entry is a number, but not a legal one for its column
    #[error("invalid value in row {row_ix}, column {col_ix}: {source}")]
    InvalidValue {
        row_ix: usize,
        col_ix: usize,
        source: ValueError,
    },
}

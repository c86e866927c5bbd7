use serde::{Deserialize, Serialize};

use crate::{ColType, DataPartition, FormatError, Schema};

/// An immutable, dense, row-major matrix of values with a column schema
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "DataMatrixRepr")]
pub struct DataMatrix {
    schema: Schema,
    n_rows: usize,
    values: Vec<f64>,
}

/// Unchecked wire form of a [`DataMatrix`]. Deserialization goes through
/// [`DataMatrix::new`] so every matrix satisfies its shape and value checks.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DataMatrixRepr {
    schema: Schema,
    n_rows: usize,
    values: Vec<f64>,
}

impl TryFrom<DataMatrixRepr> for DataMatrix {
    type Error = FormatError;

    fn try_from(repr: DataMatrixRepr) -> Result<Self, Self::Error> {
        let n_cols = repr.schema.n_cols();
        let n_values = repr.values.len();
        let shape_ok = repr
            .n_rows
            .checked_mul(n_cols)
            .map_or(false, |n| n == n_values);
        // a zero-column buffer cannot confirm its row count
        if !shape_ok || (n_cols == 0 && repr.n_rows != 0) {
            return Err(FormatError::ShapeMismatch {
                n_rows: repr.n_rows,
                n_cols,
                n_values,
            });
        }

        let rows = if n_cols == 0 {
            Vec::new()
        } else {
            repr.values.chunks(n_cols).map(<[f64]>::to_vec).collect()
        };
        Self::new(repr.schema, rows)
    }
}

impl DataMatrix {
    /// Create a matrix from rows, validating every row against the schema
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::{DataMatrix, FormatError, Schema};
    /// let schema = Schema::from_category_counts(&[0, 2]).unwrap();
    ///
    /// let ok = DataMatrix::new(schema.clone(), vec![vec![0.1, 1.0]]);
    /// assert!(ok.is_ok());
    ///
    /// let bad = DataMatrix::new(schema, vec![vec![0.1, 2.0]]);
    /// assert!(matches!(bad, Err(FormatError::InvalidValue { row_ix: 0, col_ix: 1, .. })));
    /// ```
    pub fn new(schema: Schema, rows: Vec<Vec<f64>>) -> Result<Self, FormatError> {
        let n_cols = schema.n_cols();
        let n_rows = rows.len();
        let mut values = Vec::with_capacity(n_rows * n_cols);

        for (row_ix, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(FormatError::RowLengthMismatch {
                    row_ix,
                    n_cols,
                    n_values: row.len(),
                });
            }
            for (col_ix, &x) in row.iter().enumerate() {
                schema.coltype(col_ix).validate(x).map_err(|source| {
                    FormatError::InvalidValue {
                        row_ix,
                        col_ix,
                        source,
                    }
                })?;
            }
            values.extend(row);
        }

        Ok(DataMatrix {
            schema,
            n_rows,
            values,
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.schema.n_cols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.n_cols() == 0
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn coltype(&self, col_ix: usize) -> ColType {
        self.schema.coltype(col_ix)
    }

    /// The value at (`row_ix`, `col_ix`). Panics if out of bounds.
    #[inline]
    pub fn get(&self, row_ix: usize, col_ix: usize) -> f64 {
        let n_cols = self.n_cols();
        assert!(col_ix < n_cols, "column {col_ix} out of bounds");
        self.values[row_ix * n_cols + col_ix]
    }

    /// The values in row `row_ix`
    #[inline]
    pub fn row(&self, row_ix: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[row_ix * n_cols..(row_ix + 1) * n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |row_ix| self.row(row_ix))
    }

    /// The values in column `col_ix`, in row order
    pub fn column_values(
        &self,
        col_ix: usize,
    ) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_rows).map(move |row_ix| self.get(row_ix, col_ix))
    }

    /// A view over every row and column
    pub fn partition(&self) -> DataPartition<'_> {
        DataPartition::new(
            self,
            (0..self.n_rows).collect(),
            (0..self.n_cols()).collect(),
        )
    }
}

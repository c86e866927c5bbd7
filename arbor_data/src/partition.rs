use crate::DataMatrix;

/// A view of a subset of the rows and columns of a `DataMatrix`
///
/// Holds indices only; values are read through to the underlying matrix.
#[derive(Clone, Debug)]
pub struct DataPartition<'a> {
    data: &'a DataMatrix,
    rows: Vec<usize>,
    cols: Vec<usize>,
}

impl<'a> DataPartition<'a> {
    pub fn new(data: &'a DataMatrix, rows: Vec<usize>, cols: Vec<usize>) -> Self {
        debug_assert!(rows.iter().all(|&ix| ix < data.n_rows()));
        debug_assert!(cols.iter().all(|&ix| ix < data.n_cols()));
        DataPartition { data, rows, cols }
    }

    pub fn data(&self) -> &'a DataMatrix {
        self.data
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// The values of column `col_ix` (an index into the full matrix) over the
    /// rows in this partition
    pub fn values(&self, col_ix: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |&row_ix| self.data.get(row_ix, col_ix))
    }

    /// A partition with the same columns and a different row set
    pub fn with_rows(&self, rows: Vec<usize>) -> Self {
        Self::new(self.data, rows, self.cols.clone())
    }

    /// A partition with the same rows and a different column set
    pub fn with_cols(&self, cols: Vec<usize>) -> Self {
        Self::new(self.data, self.rows.clone(), cols)
    }
}

use arbor_utils::stats::{median, Moments};
use arbor_utils::{argmax, MinMax};
use serde::{Deserialize, Serialize};

use crate::{ColType, DataMatrix};

/// Summary of the values in one column
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SummaryStatistics {
    #[serde(rename = "continuous")]
    Continuous {
        min: f64,
        max: f64,
        mean: f64,
        median: f64,
        variance: f64,
    },
    #[serde(rename = "categorical")]
    Categorical {
        counts: Vec<usize>,
        /// The most frequent category (lowest index on ties)
        mode: usize,
    },
    /// The column has no values
    None,
}

impl DataMatrix {
    /// Summarize the values in column `col_ix`
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::{DataMatrix, SummaryStatistics};
    /// let data: DataMatrix = "category_counts: 3\n0\n2\n2\n".parse().unwrap();
    ///
    /// assert_eq!(
    ///     data.summarize(0),
    ///     SummaryStatistics::Categorical { counts: vec![1, 0, 2], mode: 2 }
    /// );
    /// ```
    pub fn summarize(&self, col_ix: usize) -> SummaryStatistics {
        if self.n_rows() == 0 {
            return SummaryStatistics::None;
        }

        match self.coltype(col_ix) {
            ColType::Continuous => {
                let mut xs: Vec<f64> = self.column_values(col_ix).collect();
                let median = median(&mut xs).unwrap_or(f64::NAN);
                let (min, max) = xs
                    .iter()
                    .copied()
                    .minmax()
                    .unwrap_or((f64::NAN, f64::NAN));
                let moments = Moments::from_values(xs.iter().copied());
                SummaryStatistics::Continuous {
                    min,
                    max,
                    mean: moments.mean(),
                    median,
                    variance: moments.var_population(),
                }
            }
            ColType::Categorical { k } => {
                let mut counts = vec![0_usize; k];
                self.column_values(col_ix)
                    .for_each(|x| counts[x as usize] += 1);
                let mode = argmax(&counts);
                SummaryStatistics::Categorical { counts, mode }
            }
        }
    }
}

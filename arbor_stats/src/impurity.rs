use std::fmt;
use std::str::FromStr;

use arbor_utils::stats::Moments;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Measure of the impurity of a categorical label distribution
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum ImpurityMeasure {
    /// Shannon entropy in nats
    #[default]
    Entropy,
    /// Gini impurity, `1 - sum p^2`
    Gini,
    /// Misclassification rate, `1 - max p`
    Misclassification,
}

impl ImpurityMeasure {
    /// The impurity of the distribution with the given category counts. Zero
    /// if there are no counts.
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_stats::ImpurityMeasure;
    /// let counts = [5, 5];
    /// assert_eq!(ImpurityMeasure::Gini.impurity(&counts), 0.5);
    /// assert_eq!(ImpurityMeasure::Misclassification.impurity(&counts), 0.5);
    /// ```
    pub fn impurity(&self, counts: &[usize]) -> f64 {
        let total: usize = counts.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        let ps = counts.iter().map(|&ct| ct as f64 / n);

        match self {
            Self::Entropy => ps.filter(|&p| p > 0.0).map(|p| -p * p.ln()).sum(),
            Self::Gini => 1.0 - ps.map(|p| p * p).sum::<f64>(),
            Self::Misclassification => {
                let max = counts.iter().copied().max().unwrap_or(0);
                1.0 - max as f64 / n
            }
        }
    }
}

/// Sum of squared deviations from the mean. The variance impurity of a
/// continuous column scaled by the number of values.
pub fn sse<I: IntoIterator<Item = f64>>(xs: I) -> f64 {
    Moments::from_values(xs).sse()
}

impl fmt::Display for ImpurityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Entropy => "entropy",
            Self::Gini => "gini",
            Self::Misclassification => "misclassification",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown impurity measure `{0}`, expected entropy, gini, or misclassification")]
pub struct ParseImpurityMeasureError(String);

impl FromStr for ImpurityMeasure {
    type Err = ParseImpurityMeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entropy" => Ok(Self::Entropy),
            "gini" => Ok(Self::Gini),
            "misclassification" => Ok(Self::Misclassification),
            _ => Err(ParseImpurityMeasureError(s.to_owned())),
        }
    }
}

//! Pairwise dependence between the columns of a partition
//!
//! Every measure returns a score in `[0, 1]` where 0 means no detectable
//! dependence. Columns are joined in a product decomposition when their score
//! exceeds a threshold.
use std::fmt;
use std::str::FromStr;

use arbor_data::{ColType, DataPartition};
use arbor_utils::stats::{median, Moments};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contingency::ContingencyTable;

#[enum_dispatch]
pub trait DependenceMeasure {
    /// Dependence score between columns `col_a` and `col_b` over the rows of
    /// `partition`
    fn dependence(
        &self,
        partition: &DataPartition,
        col_a: usize,
        col_b: usize,
    ) -> f64;
}

/// Effect-size measure of association
///
/// * continuous vs continuous: absolute Pearson correlation
/// * categorical vs categorical: Cramér's V
/// * categorical vs continuous: the correlation ratio, eta
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Association;

/// One minus the p-value of Pearson's chi-square test of independence.
/// Continuous columns are split at their median.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChiSquare;

#[enum_dispatch(DependenceMeasure)]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndependenceTest {
    Association(Association),
    ChiSquare(ChiSquare),
}

impl Default for IndependenceTest {
    fn default() -> Self {
        Self::Association(Association)
    }
}

impl fmt::Display for IndependenceTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Association(_) => write!(f, "association"),
            Self::ChiSquare(_) => write!(f, "chi_square"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown independence test `{0}`, expected association or chi_square")]
pub struct ParseIndependenceTestError(String);

impl FromStr for IndependenceTest {
    type Err = ParseIndependenceTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "association" => Ok(Association.into()),
            "chi_square" => Ok(ChiSquare.into()),
            _ => Err(ParseIndependenceTestError(s.to_owned())),
        }
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let mx = Moments::from_values(xs.iter().copied());
    let my = Moments::from_values(ys.iter().copied());
    if mx.sse() <= 0.0 || my.sse() <= 0.0 {
        return 0.0;
    }
    let sxy: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - mx.mean()) * (y - my.mean()))
        .sum();
    (sxy / (mx.sse() * my.sse()).sqrt()).clamp(-1.0, 1.0)
}

fn correlation_ratio(codes: &[usize], k: usize, xs: &[f64]) -> f64 {
    let total = Moments::from_values(xs.iter().copied());
    if total.sse() <= 0.0 {
        return 0.0;
    }
    let mut groups = vec![Moments::new(); k];
    codes
        .iter()
        .zip(xs.iter())
        .for_each(|(&code, &x)| groups[code].observe(x));

    let between: f64 = groups
        .iter()
        .map(|g| {
            let diff = g.mean() - total.mean();
            g.n() as f64 * diff * diff
        })
        .sum();
    (between / total.sse()).sqrt().clamp(0.0, 1.0)
}

fn codes(partition: &DataPartition, col_ix: usize) -> Vec<usize> {
    partition.values(col_ix).map(|x| x as usize).collect()
}

impl DependenceMeasure for Association {
    fn dependence(
        &self,
        partition: &DataPartition,
        col_a: usize,
        col_b: usize,
    ) -> f64 {
        let data = partition.data();
        match (data.coltype(col_a), data.coltype(col_b)) {
            (ColType::Continuous, ColType::Continuous) => {
                let xs: Vec<f64> = partition.values(col_a).collect();
                let ys: Vec<f64> = partition.values(col_b).collect();
                pearson(&xs, &ys).abs()
            }
            (ColType::Categorical { k: ka }, ColType::Categorical { k: kb }) => {
                let pairs = partition.values(col_a).zip(partition.values(col_b));
                ContingencyTable::new(
                    ka,
                    kb,
                    pairs.map(|(a, b)| (a as usize, b as usize)),
                )
                .cramers_v()
            }
            (ColType::Categorical { k }, ColType::Continuous) => {
                let xs: Vec<f64> = partition.values(col_b).collect();
                correlation_ratio(&codes(partition, col_a), k, &xs)
            }
            (ColType::Continuous, ColType::Categorical { k }) => {
                let xs: Vec<f64> = partition.values(col_a).collect();
                correlation_ratio(&codes(partition, col_b), k, &xs)
            }
        }
    }
}

/// Category codes and the number of levels. Continuous columns become 0 at or
/// below the median and 1 above.
fn discretize(partition: &DataPartition, col_ix: usize) -> (Vec<usize>, usize) {
    match partition.data().coltype(col_ix) {
        ColType::Categorical { k } => (codes(partition, col_ix), k),
        ColType::Continuous => {
            let xs: Vec<f64> = partition.values(col_ix).collect();
            let codes = match median(&mut xs.clone()) {
                Some(m) => xs.into_iter().map(|x| usize::from(x > m)).collect(),
                None => Vec::new(),
            };
            (codes, 2)
        }
    }
}

impl DependenceMeasure for ChiSquare {
    fn dependence(
        &self,
        partition: &DataPartition,
        col_a: usize,
        col_b: usize,
    ) -> f64 {
        let (codes_a, ka) = discretize(partition, col_a);
        let (codes_b, kb) = discretize(partition, col_b);
        let table =
            ContingencyTable::new(ka, kb, codes_a.into_iter().zip(codes_b));
        1.0 - table.independence_p_value()
    }
}

//! Choosing how to split a partition
//!
//! Given a partition of rows and columns the splitter decides, in order:
//!
//! 1. a single column becomes a univariate leaf,
//! 2. too few rows become a fully factorized leaf,
//! 3. columns that fall into two or more independent groups become a product,
//! 4. rows with a good enough split on some column become a sum,
//! 5. anything else becomes a fully factorized leaf.
use arbor_data::{ColType, DataPartition};
use arbor_stats::{
    sse, DependenceMeasure, ImpurityMeasure, IndependenceTest,
};
use arbor_utils::stats::Moments;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::BuildConfig;

/// How row splits are scored
///
/// A candidate split is scored by the mean, over every column in scope, of the
/// relative impurity reduction of that column. Continuous columns use
/// variance; categorical columns use `categorical_impurity`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SplitCriterion {
    #[serde(default)]
    pub categorical_impurity: ImpurityMeasure,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeafReason {
    SingleColumn,
    TooFewRows,
    NoSplit,
}

/// A split of the partition's rows along one column
#[derive(Clone, Debug, PartialEq)]
pub struct RowSplit {
    /// The column the rows were split on
    pub column: usize,
    /// For continuous columns, rows at or below the threshold form the first
    /// cluster
    pub threshold: Option<f64>,
    /// Row indices of each cluster. Every cluster is non-empty.
    pub clusters: Vec<Vec<usize>>,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Leaf(LeafReason),
    /// Column groups, ordered by their lowest column
    Product { components: Vec<Vec<usize>> },
    Sum(RowSplit),
}

/// Decides how each partition is split
#[derive(Clone, Debug)]
pub struct Splitter<'a> {
    config: &'a BuildConfig,
    independence: IndependenceTest,
    criterion: SplitCriterion,
}

impl<'a> Splitter<'a> {
    pub fn new(
        config: &'a BuildConfig,
        independence: IndependenceTest,
        criterion: SplitCriterion,
    ) -> Self {
        Splitter {
            config,
            independence,
            criterion,
        }
    }

    pub fn decide(&self, partition: &DataPartition) -> Decision {
        if partition.n_cols() == 1 {
            return Decision::Leaf(LeafReason::SingleColumn);
        }

        if partition.n_rows() < self.config.min_instances_slice {
            return Decision::Leaf(LeafReason::TooFewRows);
        }

        let components = self.components(partition);
        if components.len() > 1 {
            return Decision::Product { components };
        }

        match self.best_row_split(partition) {
            Some(split) => Decision::Sum(split),
            None => Decision::Leaf(LeafReason::NoSplit),
        }
    }

    /// Groups of columns connected by a dependence score above the
    /// independence threshold
    pub fn components(&self, partition: &DataPartition) -> Vec<Vec<usize>> {
        let cols = partition.cols();
        let mut roots: Vec<usize> = (0..cols.len()).collect();

        for (i, j) in (0..cols.len()).tuple_combinations() {
            let (ri, rj) = (find_root(&mut roots, i), find_root(&mut roots, j));
            if ri == rj {
                continue;
            }
            let score =
                self.independence.dependence(partition, cols[i], cols[j]);
            if score > self.config.independence_threshold {
                // the smaller position stays the root
                roots[ri.max(rj)] = ri.min(rj);
            }
        }

        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut component_of_root = vec![usize::MAX; cols.len()];
        for pos in 0..cols.len() {
            let root = find_root(&mut roots, pos);
            if component_of_root[root] == usize::MAX {
                component_of_root[root] = components.len();
                components.push(Vec::new());
            }
            components[component_of_root[root]].push(cols[pos]);
        }

        components.iter_mut().for_each(|cols| cols.sort_unstable());
        components.sort_by_key(|cols| cols[0]);
        components
    }

    /// The highest scoring row split, if it scores above `min_gain`. Ties go
    /// to the lowest column index.
    pub fn best_row_split(&self, partition: &DataPartition) -> Option<RowSplit> {
        let parent_impurity: Vec<f64> = partition
            .cols()
            .iter()
            .map(|&col_ix| self.impurity(partition, col_ix, partition.rows()))
            .collect();

        let mut candidate_cols = partition.cols().to_vec();
        candidate_cols.sort_unstable();

        let mut best: Option<RowSplit> = None;
        for col_ix in candidate_cols {
            let Some((threshold, clusters)) = cluster_rows(partition, col_ix)
            else {
                continue;
            };

            let score =
                self.score(partition, &parent_impurity, &clusters);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(RowSplit {
                    column: col_ix,
                    threshold,
                    clusters,
                    score,
                });
            }
        }

        best.filter(|split| split.score > self.config.min_gain)
    }

    /// Impurity of column `col_ix` over `rows`, scaled by the number of rows
    fn impurity(
        &self,
        partition: &DataPartition,
        col_ix: usize,
        rows: &[usize],
    ) -> f64 {
        let data = partition.data();
        let values = rows.iter().map(|&row_ix| data.get(row_ix, col_ix));
        match data.coltype(col_ix) {
            ColType::Continuous => sse(values),
            ColType::Categorical { k } => {
                let mut counts = vec![0_usize; k];
                values.for_each(|x| counts[x as usize] += 1);
                let measure = self.criterion.categorical_impurity;
                measure.impurity(&counts) * rows.len() as f64
            }
        }
    }

    fn score(
        &self,
        partition: &DataPartition,
        parent_impurity: &[f64],
        clusters: &[Vec<usize>],
    ) -> f64 {
        let reductions = partition.cols().iter().zip(parent_impurity).map(
            |(&col_ix, &parent)| {
                if parent <= 0.0 {
                    return 0.0;
                }
                let children: f64 = clusters
                    .iter()
                    .map(|rows| self.impurity(partition, col_ix, rows))
                    .sum();
                (parent - children) / parent
            },
        );
        arbor_utils::stats::mean(reductions)
    }
}

fn find_root(roots: &mut [usize], mut ix: usize) -> usize {
    while roots[ix] != ix {
        roots[ix] = roots[roots[ix]];
        ix = roots[ix];
    }
    ix
}

/// Candidate row clusters along `col_ix`. `None` if the column takes a single
/// value over the partition.
fn cluster_rows(
    partition: &DataPartition,
    col_ix: usize,
) -> Option<(Option<f64>, Vec<Vec<usize>>)> {
    let data = partition.data();
    match data.coltype(col_ix) {
        ColType::Categorical { k } => {
            let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); k];
            partition.rows().iter().for_each(|&row_ix| {
                clusters[data.get(row_ix, col_ix) as usize].push(row_ix)
            });
            clusters.retain(|rows| !rows.is_empty());
            (clusters.len() > 1).then_some((None, clusters))
        }
        ColType::Continuous => {
            let threshold = best_threshold(partition, col_ix)?;
            let (left, right): (Vec<usize>, Vec<usize>) = partition
                .rows()
                .iter()
                .copied()
                .partition(|&row_ix| data.get(row_ix, col_ix) <= threshold);
            Some((Some(threshold), vec![left, right]))
        }
    }
}

/// The midpoint between consecutive distinct values that minimizes the
/// summed squared error of the two sides. Ties go to the lowest threshold.
fn best_threshold(partition: &DataPartition, col_ix: usize) -> Option<f64> {
    let mut xs: Vec<f64> = partition.values(col_ix).collect();
    xs.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = xs.len();
    if n < 2 {
        return None;
    }

    // right_sse[i] is the error of xs[i..]
    let mut right_sse = vec![0.0; n + 1];
    let mut right = Moments::new();
    for i in (0..n).rev() {
        right.observe(xs[i]);
        right_sse[i] = right.sse();
    }

    let mut left = Moments::new();
    let mut best: Option<(f64, usize)> = None;
    for i in 1..n {
        left.observe(xs[i - 1]);
        if xs[i - 1] >= xs[i] {
            continue;
        }
        let total = left.sse() + right_sse[i];
        if best.map_or(true, |(best_total, _)| total < best_total) {
            best = Some((total, i));
        }
    }

    best.map(|(_, i)| {
        let (lo, hi) = (xs[i - 1], xs[i]);
        let mid = lo / 2.0 + hi / 2.0;
        // adjacent floats can round the midpoint up onto `hi`
        if mid < hi {
            mid
        } else {
            lo
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use arbor_data::{DataMatrix, Schema};
    use arbor_stats::ChiSquare;

    fn config(min_instances_slice: usize, threshold: f64) -> BuildConfig {
        BuildConfig {
            min_instances_slice,
            independence_threshold: threshold,
            min_gain: 0.0,
            max_depth: 10,
            leaf_smoothing_alpha: 1.0,
            variance_floor_epsilon: 1E-6,
            n_threads: None,
        }
    }

    fn data(counts: &[usize], rows: Vec<Vec<f64>>) -> DataMatrix {
        let schema = Schema::from_category_counts(counts).unwrap();
        DataMatrix::new(schema, rows).unwrap()
    }

    #[test]
    fn single_column_is_a_leaf() {
        let data = data(&[0], (0..50).map(|i| vec![i as f64]).collect());
        let cfg = config(1, 0.3);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        assert_eq!(
            splitter.decide(&data.partition()),
            Decision::Leaf(LeafReason::SingleColumn)
        );
    }

    #[test]
    fn few_rows_is_a_leaf() {
        let data = data(&[0, 0], (0..5).map(|i| vec![i as f64, 0.0]).collect());
        let cfg = config(6, 0.3);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        assert_eq!(
            splitter.decide(&data.partition()),
            Decision::Leaf(LeafReason::TooFewRows)
        );
    }

    #[test]
    fn dependent_pairs_form_components() {
        // columns 0 and 2 are copies; 1 and 3 are copies; the pairs are
        // unrelated to each other
        let rows = (0..40)
            .map(|i| {
                let a = (i % 2) as f64;
                let b = ((i / 2) % 2) as f64;
                vec![a, b, a, b]
            })
            .collect();
        let data = data(&[2, 2, 2, 2], rows);
        let cfg = config(1, 0.5);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        assert_eq!(
            splitter.decide(&data.partition()),
            Decision::Product {
                components: vec![vec![0, 2], vec![1, 3]]
            }
        );
    }

    #[test]
    fn chi_square_test_finds_the_same_components() {
        let rows = (0..40)
            .map(|i| {
                let a = (i % 2) as f64;
                let b = ((i / 2) % 2) as f64;
                vec![a, b, a, b]
            })
            .collect();
        let data = data(&[2, 2, 2, 2], rows);
        let cfg = config(1, 0.95);
        let splitter =
            Splitter::new(&cfg, ChiSquare.into(), Default::default());
        assert_eq!(
            splitter.components(&data.partition()),
            vec![vec![0, 2], vec![1, 3]]
        );
    }

    #[test]
    fn fully_connected_columns_form_one_component() {
        let data = data(
            &[0, 0, 0],
            (0..30).map(|i| vec![i as f64, 2.0 * i as f64, -(i as f64)]).collect(),
        );
        let cfg = config(1, 0.3);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        assert_eq!(splitter.components(&data.partition()), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn continuous_threshold_separates_clusters() {
        let mut xs = vec![1.0, 1.1, 0.9, 1.05];
        xs.extend([10.0, 10.2, 9.9, 10.1]);
        let data = data(&[0], xs.iter().map(|&x| vec![x]).collect());
        let threshold = best_threshold(&data.partition(), 0).unwrap();
        assert_relative_eq!(threshold, 5.5, epsilon = 1E-12);
    }

    #[test]
    fn threshold_ties_go_low() {
        // splitting 0 | 1 2 or 0 1 | 2 reduce the error equally
        let data = data(&[0], vec![vec![0.0], vec![1.0], vec![2.0]]);
        let threshold = best_threshold(&data.partition(), 0).unwrap();
        assert_relative_eq!(threshold, 0.5, epsilon = 1E-12);
    }

    #[test]
    fn constant_column_has_no_threshold() {
        let data = data(&[0], vec![vec![3.0]; 4]);
        assert!(best_threshold(&data.partition(), 0).is_none());
    }

    #[test]
    fn categorical_split_has_one_cluster_per_observed_category() {
        let data = data(
            &[4],
            vec![vec![3.0], vec![0.0], vec![3.0], vec![1.0], vec![0.0]],
        );
        let (threshold, clusters) = cluster_rows(&data.partition(), 0).unwrap();
        assert!(threshold.is_none());
        assert_eq!(clusters, vec![vec![1, 4], vec![3], vec![0, 2]]);
    }

    #[test]
    fn single_category_is_not_a_candidate() {
        let data = data(&[3], vec![vec![2.0]; 3]);
        assert!(cluster_rows(&data.partition(), 0).is_none());
    }

    #[test]
    fn dependent_mixture_becomes_a_sum() {
        // two well separated blobs in which the columns move together
        let rows = (0..40)
            .map(|i| {
                let offset = if i < 20 { 0.0 } else { 100.0 };
                let jitter = (i % 5) as f64 * 0.1;
                vec![offset + jitter, offset - jitter]
            })
            .collect();
        let data = data(&[0, 0], rows);
        let cfg = config(1, 0.3);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        match splitter.decide(&data.partition()) {
            Decision::Sum(split) => {
                assert_eq!(split.column, 0);
                assert_eq!(split.clusters.len(), 2);
                assert_eq!(split.clusters[0], (0..20).collect::<Vec<_>>());
                assert_eq!(split.clusters[1], (20..40).collect::<Vec<_>>());
                assert!(split.score > 0.99);
            }
            other => panic!("expected a sum, got {other:?}"),
        }
    }

    #[test]
    fn min_gain_blocks_weak_splits() {
        let rows = (0..40)
            .map(|i| {
                let offset = if i < 20 { 0.0 } else { 100.0 };
                let jitter = (i % 5) as f64 * 0.1;
                vec![offset + jitter, offset - jitter]
            })
            .collect();
        let data = data(&[0, 0], rows);
        let mut cfg = config(1, 0.3);
        cfg.min_gain = 1.0;
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        assert_eq!(
            splitter.decide(&data.partition()),
            Decision::Leaf(LeafReason::NoSplit)
        );
    }

    #[test]
    fn split_score_averages_over_columns() {
        // col 0 splits perfectly; col 1 is constant so contributes zero
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
        ];
        let data = data(&[2, 2], rows);
        let cfg = config(1, 0.3);
        let splitter = Splitter::new(&cfg, Default::default(), Default::default());
        let split = splitter.best_row_split(&data.partition()).unwrap();
        assert_eq!(split.column, 0);
        assert_relative_eq!(split.score, 0.5, epsilon = 1E-12);
    }
}

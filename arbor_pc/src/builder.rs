use arbor_data::{DataMatrix, DataPartition};
use arbor_stats::IndependenceTest;
use rayon::prelude::*;

use crate::arena::{assemble, FlatNode};
use crate::handler::{BuildEvent, BuildHandler};
use crate::node::Leaf;
use crate::splitter::{Decision, SplitCriterion, Splitter};
use crate::{BuildConfig, BuildError, Circuit};

/// Learns the structure and parameters of a circuit from data
///
/// # Example
///
/// ```
/// # use arbor_data::DataMatrix;
/// # use arbor_pc::{BuildConfig, CircuitBuilder, SplitCriterion};
/// # use arbor_stats::{ChiSquare, ImpurityMeasure};
/// let data: DataMatrix = "category_counts: 2 0\n0 1.5\n1 2.5\n0 1.0\n"
///     .parse()
///     .unwrap();
///
/// let config = BuildConfig {
///     min_instances_slice: 2,
///     independence_threshold: 0.9,
///     min_gain: 0.0,
///     max_depth: 4,
///     leaf_smoothing_alpha: 1.0,
///     variance_floor_epsilon: 1E-6,
///     n_threads: Some(2),
/// };
///
/// let circuit = CircuitBuilder::new(config)
///     .with_independence_test(ChiSquare.into())
///     .with_split_criterion(SplitCriterion {
///         categorical_impurity: ImpurityMeasure::Gini,
///     })
///     .build(&data)
///     .unwrap();
///
/// assert_eq!(circuit.n_cols(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct CircuitBuilder {
    config: BuildConfig,
    independence: IndependenceTest,
    criterion: SplitCriterion,
}

/// Build a circuit with the default independence test and split criterion
pub fn build(
    data: &DataMatrix,
    config: &BuildConfig,
) -> Result<Circuit, BuildError> {
    CircuitBuilder::new(config.clone()).build(data)
}

impl CircuitBuilder {
    pub fn new(config: BuildConfig) -> Self {
        CircuitBuilder {
            config,
            independence: IndependenceTest::default(),
            criterion: SplitCriterion::default(),
        }
    }

    /// Set the test used to find independent column groups
    #[must_use]
    pub fn with_independence_test(mut self, test: IndependenceTest) -> Self {
        self.independence = test;
        self
    }

    /// Set how candidate row splits are scored
    #[must_use]
    pub fn with_split_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, data: &DataMatrix) -> Result<Circuit, BuildError> {
        self.build_with_handler(data, ())
    }

    /// Build, reporting progress to `handler`
    ///
    /// Nodes are decided one depth level at a time. All pending partitions at
    /// a level are decided in parallel, and the results are stored by node
    /// index, so the circuit does not depend on scheduling.
    pub fn build_with_handler<H: BuildHandler>(
        &self,
        data: &DataMatrix,
        mut handler: H,
    ) -> Result<Circuit, BuildError> {
        self.config.validate()?;
        if data.is_empty() {
            return Err(BuildError::EmptyData {
                n_rows: data.n_rows(),
                n_cols: data.n_cols(),
            });
        }

        let pool = self
            .config
            .n_threads
            .map(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build())
            .transpose()?;

        handler.global_init(&self.config, data);

        let splitter =
            Splitter::new(&self.config, self.independence, self.criterion);
        let alpha = self.config.leaf_smoothing_alpha;
        let epsilon = self.config.variance_floor_epsilon;

        let decide = |frontier: &[(usize, DataPartition)]| {
            frontier
                .par_iter()
                .map(|(_, partition)| {
                    let decision = splitter.decide(partition);
                    let leaf = match decision {
                        Decision::Leaf(_) => {
                            Some(Leaf::fit(partition, alpha, epsilon))
                        }
                        _ => None,
                    };
                    (decision, leaf)
                })
                .collect::<Vec<_>>()
        };

        let mut slots: Vec<Option<FlatNode>> = vec![None];
        let mut frontier: Vec<(usize, DataPartition)> = vec![(0, data.partition())];
        let mut depth = 0;

        while !frontier.is_empty() {
            handler.new_level(depth, frontier.len());

            let decisions = match &pool {
                Some(pool) => pool.install(|| decide(&frontier)),
                None => decide(&frontier),
            };

            let mut next_frontier: Vec<(usize, DataPartition)> = Vec::new();
            for ((node_ix, partition), (decision, leaf)) in
                frontier.into_iter().zip(decisions)
            {
                handler.node_decided(&BuildEvent {
                    node_ix,
                    depth,
                    n_rows: partition.n_rows(),
                    n_cols: partition.n_cols(),
                    decision: &decision,
                });

                if !matches!(decision, Decision::Leaf(_))
                    && depth + 1 > self.config.max_depth
                {
                    return Err(BuildError::MaxDepthExceeded {
                        parent_depth: depth,
                        child_depth: depth + 1,
                        max_depth: self.config.max_depth,
                    });
                }

                let mut push_child = |child| {
                    let child_ix = slots.len();
                    slots.push(None);
                    next_frontier.push((child_ix, child));
                    child_ix
                };

                let node = match (decision, leaf) {
                    (Decision::Sum(split), _) => {
                        let n = partition.n_rows() as f64;
                        let weights = split
                            .clusters
                            .iter()
                            .map(|rows| rows.len() as f64 / n)
                            .collect();
                        let children = split
                            .clusters
                            .into_iter()
                            .map(|rows| push_child(partition.with_rows(rows)))
                            .collect();
                        FlatNode::Sum { children, weights }
                    }
                    (Decision::Product { components }, _) => {
                        let children = components
                            .into_iter()
                            .map(|cols| push_child(partition.with_cols(cols)))
                            .collect();
                        FlatNode::Product { children }
                    }
                    (Decision::Leaf(_), Some(leaf)) => FlatNode::Leaf(leaf),
                    (Decision::Leaf(_), None) => {
                        unreachable!("leaves are fitted with their decision")
                    }
                };
                slots[node_ix] = Some(node);
            }

            frontier = next_frontier;
            depth += 1;
        }

        let nodes = slots
            .into_iter()
            .collect::<Option<Vec<FlatNode>>>()
            .expect("every allocated node is decided before the frontier empties");
        let root = assemble(nodes)
            .expect("nodes allocated by the builder form a tree");
        let circuit = Circuit::new_unchecked(data.schema().clone(), root);

        handler.finalize(&circuit);
        Ok(circuit)
    }
}

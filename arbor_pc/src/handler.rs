use arbor_data::DataMatrix;
use log::{debug, info};

use crate::splitter::{Decision, LeafReason};
use crate::{BuildConfig, Circuit};

/// A node the builder has just decided on
#[derive(Clone, Debug)]
pub struct BuildEvent<'a> {
    /// Arena index of the node. Children always have higher indices.
    pub node_ix: usize,
    pub depth: usize,
    pub n_rows: usize,
    pub n_cols: usize,
    pub decision: &'a Decision,
}

/// Observer for `CircuitBuilder::build_with_handler`.
///
/// Every method has a no-op default, so implementors only override the
/// events they care about. Events are delivered on the calling thread in
/// node index order.
///
/// # Example
///
/// Count the number of sum nodes as they are created.
///
/// ```
/// use arbor_data::DataMatrix;
/// use arbor_pc::{BuildConfig, BuildEvent, BuildHandler, CircuitBuilder, Decision};
///
/// #[derive(Default)]
/// struct SumCounter(usize);
///
/// impl BuildHandler for SumCounter {
///     fn node_decided(&mut self, event: &BuildEvent) {
///         if let Decision::Sum(_) = event.decision {
///             self.0 += 1;
///         }
///     }
/// }
///
/// let data: DataMatrix = "category_counts: 0 0\n0 0\n0.1 0.1\n10 10\n10.1 10.1\n"
///     .parse()
///     .unwrap();
/// let config = BuildConfig {
///     min_instances_slice: 3,
///     independence_threshold: 0.3,
///     min_gain: 0.0,
///     max_depth: 10,
///     leaf_smoothing_alpha: 1.0,
///     variance_floor_epsilon: 1E-6,
///     n_threads: None,
/// };
///
/// let mut counter = SumCounter::default();
/// CircuitBuilder::new(config)
///     .build_with_handler(&data, &mut counter)
///     .unwrap();
/// assert_eq!(counter.0, 1);
/// ```
pub trait BuildHandler {
    /// Called once after the configuration and data have been checked, before
    /// any node is decided
    fn global_init(&mut self, _config: &BuildConfig, _data: &DataMatrix) {}

    /// Called before the nodes at `depth` are decided
    fn new_level(&mut self, _depth: usize, _n_pending: usize) {}

    /// Called after each node is decided
    fn node_decided(&mut self, _event: &BuildEvent) {}

    /// Called with the finished circuit
    fn finalize(&mut self, _circuit: &Circuit) {}
}

impl BuildHandler for () {}

impl<H: BuildHandler + ?Sized> BuildHandler for &mut H {
    fn global_init(&mut self, config: &BuildConfig, data: &DataMatrix) {
        (**self).global_init(config, data);
    }

    fn new_level(&mut self, depth: usize, n_pending: usize) {
        (**self).new_level(depth, n_pending);
    }

    fn node_decided(&mut self, event: &BuildEvent) {
        (**self).node_decided(event);
    }

    fn finalize(&mut self, circuit: &Circuit) {
        (**self).finalize(circuit);
    }
}

macro_rules! impl_tuple {
($($idx:tt $t:tt),+) => {
    impl<$($t,)+> BuildHandler for ($($t,)+)
    where
        $($t: BuildHandler,)+
    {
        fn global_init(&mut self, config: &BuildConfig, data: &DataMatrix) {
            $(
                self.$idx.global_init(config, data);
            )+
        }

        fn new_level(&mut self, depth: usize, n_pending: usize) {
            $(
                self.$idx.new_level(depth, n_pending);
            )+
        }

        fn node_decided(&mut self, event: &BuildEvent) {
            $(
                self.$idx.node_decided(event);
            )+
        }

        fn finalize(&mut self, circuit: &Circuit) {
            $(
                self.$idx.finalize(circuit);
            )+
        }
    }
};
}

impl_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_tuple!(0 A, 1 B, 2 C, 3 D);
impl_tuple!(0 A, 1 B, 2 C);
impl_tuple!(0 A, 1 B);
impl_tuple!(0 A);

impl<T> BuildHandler for Vec<T>
where
    T: BuildHandler,
{
    fn global_init(&mut self, config: &BuildConfig, data: &DataMatrix) {
        self.iter_mut()
            .for_each(|handler| handler.global_init(config, data));
    }

    fn new_level(&mut self, depth: usize, n_pending: usize) {
        self.iter_mut()
            .for_each(|handler| handler.new_level(depth, n_pending));
    }

    fn node_decided(&mut self, event: &BuildEvent) {
        self.iter_mut()
            .for_each(|handler| handler.node_decided(event));
    }

    fn finalize(&mut self, circuit: &Circuit) {
        self.iter_mut().for_each(|handler| handler.finalize(circuit));
    }
}

/// Forwards build events to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHandler;

impl BuildHandler for LogHandler {
    fn global_init(&mut self, config: &BuildConfig, data: &DataMatrix) {
        info!(
            "Building circuit from {} rows and {} columns (max depth {})",
            data.n_rows(),
            data.n_cols(),
            config.max_depth
        );
    }

    fn new_level(&mut self, depth: usize, n_pending: usize) {
        debug!("Deciding {n_pending} nodes at depth {depth}");
    }

    fn node_decided(&mut self, event: &BuildEvent) {
        let BuildEvent {
            node_ix,
            depth,
            n_rows,
            n_cols,
            decision,
        } = event;
        match decision {
            Decision::Leaf(reason) => {
                let reason = match reason {
                    LeafReason::SingleColumn => "single column",
                    LeafReason::TooFewRows => "too few rows",
                    LeafReason::NoSplit => "no split",
                };
                debug!(
                    "node {node_ix} (depth {depth}, {n_rows}x{n_cols}): leaf, {reason}"
                );
            }
            Decision::Product { components } => debug!(
                "node {node_ix} (depth {depth}, {n_rows}x{n_cols}): product of {} column groups",
                components.len()
            ),
            Decision::Sum(split) => debug!(
                "node {node_ix} (depth {depth}, {n_rows}x{n_cols}): sum of {} clusters on column {} (score {:.4})",
                split.clusters.len(),
                split.column,
                split.score
            ),
        }
    }

    fn finalize(&mut self, circuit: &Circuit) {
        let stats = circuit.stats();
        info!(
            "Built circuit with {} nodes ({} sum, {} product, {} leaf), depth {}",
            stats.n_nodes,
            stats.n_sum,
            stats.n_product,
            stats.n_leaf,
            stats.depth
        );
    }
}

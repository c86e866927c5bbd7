//! Learning and inference for tractable probabilistic circuits.
//!
//! Arbor learns a probabilistic circuit from tabular data by recursively
//! partitioning it: rows are clustered into mixtures (sum nodes) and
//! independent groups of columns are factored apart (product nodes) until the
//! partitions are simple enough to model one column at a time. The learned
//! circuit answers likelihood, marginal, most-probable-explanation, and
//! sampling queries exactly, in time linear in its size.
//!
//! # Example
//!
//! ```
//! use arbor::{build, BuildConfig, DataMatrix};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let data: DataMatrix = "\
//! dataset: 1.0
//! category_counts: 0 2
//! features: weight smoker
//! 61.2 0
//! 58.4 0
//! 90.1 1
//! 88.7 1
//! 63.0 0
//! 91.5 1
//! "
//! .parse()
//! .unwrap();
//!
//! let config = BuildConfig {
//!     min_instances_slice: 2,
//!     independence_threshold: 0.3,
//!     min_gain: 0.01,
//!     max_depth: 8,
//!     leaf_smoothing_alpha: 1.0,
//!     variance_floor_epsilon: 1E-3,
//!     n_threads: None,
//! };
//!
//! let circuit = build(&data, &config).unwrap();
//!
//! // p(weight = 60, smoker = 0)
//! let ln_p = circuit.ln_likelihood(&[60.0, 0.0]).unwrap();
//! assert!(ln_p.is_finite());
//!
//! // p(smoker = 1), marginalizing weight
//! let ln_p_smoker = circuit.ln_marginal(&[0.0, 1.0], &[false, true]).unwrap();
//! assert!(ln_p_smoker < 0.0);
//!
//! // the most likely smoking status of someone who weighs 90
//! let completed = circuit.map(&[Some(90.0), None]).unwrap();
//! assert_eq!(completed[1], 1.0);
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(1337);
//! let samples = circuit.sample_n(10, &mut rng);
//! assert_eq!(samples.n_rows(), 10);
//! ```
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone,
    clippy::perf
)]

pub mod metadata;

pub use arbor_data::{
    ColType, DataMatrix, DataPartition, FormatError, Schema, SummaryStatistics,
};
pub use arbor_pc::{
    build, BuildConfig, BuildError, BuildEvent, BuildHandler, Circuit,
    CircuitBuilder, CircuitError, CircuitStats, InvalidValueError, LogHandler,
    Node, SplitCriterion,
};
pub use arbor_stats::{
    Association, ChiSquare, ImpurityMeasure, IndependenceTest, LeafModel,
};

pub mod data {
    pub use arbor_data::*;
}

pub mod pc {
    pub use arbor_pc::*;
}

pub mod stats {
    pub use arbor_stats::*;
}

pub mod utils {
    pub use arbor_utils::*;
}

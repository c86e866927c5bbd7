//! Learning and querying probabilistic circuits.
//!
//! A circuit is a tree of sum (mixture), product (factorization), and leaf
//! (univariate distribution) nodes. [`CircuitBuilder`] learns the structure by
//! recursively splitting a [`DataMatrix`](arbor_data::DataMatrix): rows are
//! clustered into sum nodes and independent column groups into product nodes.
//! Because every sum is smooth and every product decomposable, likelihoods,
//! marginals, and samples are computed in a single pass over the tree.
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
mod arena;
pub mod builder;
pub mod circuit;
pub mod config;
pub mod error;
pub mod handler;
pub mod node;
mod query;
pub mod splitter;

pub use builder::{build, CircuitBuilder};
pub use circuit::{
    Circuit, CircuitStats, SerializedCircuit, MAX_CIRCUIT_DEPTH,
};
pub use config::BuildConfig;
pub use error::{BuildError, CircuitError, InvalidValueError};
pub use handler::{BuildEvent, BuildHandler, LogHandler};
pub use node::{Leaf, Node};
pub use splitter::{Decision, LeafReason, RowSplit, SplitCriterion, Splitter};

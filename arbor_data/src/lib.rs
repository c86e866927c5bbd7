//! Data definitions for Arbor.
//!
//! A [`DataMatrix`] is a dense, row-major matrix of `f64` values together
//! with a [`Schema`] declaring the kind of each column. Categorical values are
//! stored as their category index (`0.0`, `1.0`, ...). The matrix is immutable
//! once constructed; learners work on [`DataPartition`] views, which hold row
//! and column indices only.
//!
//! # Example
//!
//! ```
//! use arbor_data::{ColType, DataMatrix};
//!
//! let text = "\
//! dataset: 1.0
//! category_counts: 0 2
//! 0.5 0
//! 1.5 1
//! ";
//!
//! let data: DataMatrix = text.parse().unwrap();
//! assert_eq!(data.n_rows(), 2);
//! assert_eq!(data.coltype(1), ColType::Categorical { k: 2 });
//! assert_eq!(data.get(1, 0), 1.5);
//! ```
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

mod coltype;
mod error;
mod io;
mod matrix;
mod partition;
mod schema;
mod summary;

pub use coltype::{
    ColType, ValueError, MAX_CATEGORIES, MAX_CONTINUOUS_MAGNITUDE,
};
pub use error::FormatError;
pub use io::DATASET_VERSION;
pub use matrix::DataMatrix;
pub use partition::DataPartition;
pub use schema::Schema;
pub use summary::SummaryStatistics;

//! Per-column distributions and the statistics used to learn circuit
//! structure.
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
mod chi_square;
mod contingency;
pub mod dependence;
mod impurity;
mod leaf;

pub use dependence::{
    Association, ChiSquare, DependenceMeasure, IndependenceTest,
    ParseIndependenceTestError,
};
pub use impurity::{sse, ImpurityMeasure, ParseImpurityMeasureError};
pub use leaf::{LeafModel, LeafParamsError};
pub use rv;

pub mod test {
    pub use super::chi_square::{chi_square_cdf, chi_square_test};
    pub use super::contingency::ContingencyTable;
}

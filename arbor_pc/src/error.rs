use arbor_data::{ColType, ValueError};
use arbor_stats::LeafParamsError;
use thiserror::Error;

/// Errors that can arise while learning a circuit
#[derive(Debug, Error)]
pub enum BuildError {
    /// A sum or product node would place its children deeper than allowed
    #[error(
        "a split at depth {parent_depth} would place children at depth \
        {child_depth}, but max_depth is {max_depth}"
    )]
    MaxDepthExceeded {
        parent_depth: usize,
        child_depth: usize,
        max_depth: usize,
    },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("cannot build a circuit from data with {n_rows} rows and {n_cols} columns")]
    EmptyData { n_rows: usize, n_cols: usize },
    #[error("failed to create the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A query value that is incompatible with its column
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidValueError {
    #[error("the circuit has {n_cols} columns but the row has {n_values} values")]
    RowLengthMismatch { n_cols: usize, n_values: usize },
    #[error("the circuit has {n_cols} columns but the mask has {n_mask} entries")]
    MaskLengthMismatch { n_cols: usize, n_mask: usize },
    #[error("invalid value {value} for column {col_ix} ({coltype}): {source}")]
    InvalidValue {
        col_ix: usize,
        coltype: ColType,
        value: f64,
        source: ValueError,
    },
    #[error(
        "column {col_ix} of the data is {found} but the circuit expects \
        {expected}"
    )]
    ColTypeMismatch {
        col_ix: usize,
        expected: ColType,
        found: ColType,
    },
    #[error("the circuit has {n_cols} columns but the data has {n_data_cols}")]
    ColumnCountMismatch { n_cols: usize, n_data_cols: usize },
    #[error("row {row_ix}: {source}")]
    InRow {
        row_ix: usize,
        source: Box<InvalidValueError>,
    },
}

/// A structural defect in a circuit. Node indices are breadth-first, root
/// first.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError {
    #[error("the circuit has no nodes")]
    NoNodes,
    #[error("node {node_ix} refers to child {child_ix}, which does not exist or comes before it")]
    InvalidChildIndex { node_ix: usize, child_ix: usize },
    #[error("node {node_ix} is the child of more than one node")]
    SharedChild { node_ix: usize },
    #[error("node {node_ix} is not reachable from the root")]
    Unreachable { node_ix: usize },
    #[error("node {node_ix} has no children")]
    NoChildren { node_ix: usize },
    #[error("leaf {node_ix} has no factors")]
    EmptyLeaf { node_ix: usize },
    #[error("sum node {node_ix} has {n_children} children but {n_weights} weights")]
    WeightCountMismatch {
        node_ix: usize,
        n_children: usize,
        n_weights: usize,
    },
    #[error("sum node {node_ix} has weights that are negative, non-finite, or sum to {sum}")]
    InvalidWeights { node_ix: usize, sum: f64 },
    #[error("child {child_ix} of sum node {node_ix} has a different scope than its parent")]
    NotSmooth { node_ix: usize, child_ix: usize },
    #[error("children of product node {node_ix} share column {col_ix}")]
    NotDecomposable { node_ix: usize, col_ix: usize },
    #[error("leaf {node_ix} has more than one factor for column {col_ix}")]
    DuplicateLeafColumn { node_ix: usize, col_ix: usize },
    #[error("node {node_ix} refers to column {col_ix} but there are {n_cols} columns")]
    ColumnOutOfBounds {
        node_ix: usize,
        col_ix: usize,
        n_cols: usize,
    },
    #[error("node {node_ix} sits at depth {depth}, deeper than the maximum of {max_depth}")]
    TooDeep {
        node_ix: usize,
        depth: usize,
        max_depth: usize,
    },
    #[error("the root covers {n_scope} of the {n_cols} columns")]
    IncompleteRootScope { n_scope: usize, n_cols: usize },
    #[error(
        "leaf {node_ix} models column {col_ix} as {found} but the schema says \
        {expected}"
    )]
    LeafKindMismatch {
        node_ix: usize,
        col_ix: usize,
        expected: ColType,
        found: ColType,
    },
    #[error("leaf {node_ix}, column {col_ix}: {source}")]
    InvalidLeafParams {
        node_ix: usize,
        col_ix: usize,
        source: LeafParamsError,
    },
}

use std::collections::VecDeque;
use std::convert::TryFrom;

use arbor_data::Schema;
use serde::{Deserialize, Serialize, Serializer};

use crate::arena::{assemble, check_links, flatten, FlatNode};
use crate::node::Node;
use crate::CircuitError;

const WEIGHT_SUM_TOL: f64 = 1E-8;

/// The deepest any node of a valid circuit may sit. The root is at depth 0.
/// Queries recurse once per level.
pub const MAX_CIRCUIT_DEPTH: usize = 1024;

/// A learned probabilistic circuit over the columns of a schema
///
/// Circuits are immutable. Serialized circuits store their nodes in
/// breadth-first order with children referred to by index, and are validated
/// when deserialized.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "SerializedCircuit")]
pub struct Circuit {
    schema: Schema,
    root: Node,
}

/// Node counts and depth of a circuit
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitStats {
    pub n_nodes: usize,
    pub n_sum: usize,
    pub n_product: usize,
    pub n_leaf: usize,
    /// Depth of the deepest node. The root is at depth 0.
    pub depth: usize,
}

impl Circuit {
    /// Create a circuit, checking that it is well formed
    pub fn new(schema: Schema, root: Node) -> Result<Self, CircuitError> {
        let circuit = Circuit::new_unchecked(schema, root);
        circuit.validate()?;
        Ok(circuit)
    }

    /// Create a circuit without checking it
    pub fn new_unchecked(schema: Schema, root: Node) -> Self {
        Circuit { schema, root }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn n_cols(&self) -> usize {
        self.schema.n_cols()
    }

    /// Visit every node breadth first along with its depth
    pub fn iter_bfs(&self) -> Bfs<'_> {
        Bfs {
            queue: VecDeque::from([(0, &self.root)]),
        }
    }

    pub fn stats(&self) -> CircuitStats {
        self.iter_bfs().fold(
            CircuitStats {
                n_nodes: 0,
                n_sum: 0,
                n_product: 0,
                n_leaf: 0,
                depth: 0,
            },
            |mut stats, (depth, node)| {
                stats.n_nodes += 1;
                stats.depth = stats.depth.max(depth);
                match node {
                    Node::Sum { .. } => stats.n_sum += 1,
                    Node::Product { .. } => stats.n_product += 1,
                    Node::Leaf(_) => stats.n_leaf += 1,
                }
                stats
            },
        )
    }

    /// Check that the circuit is well formed
    ///
    /// * the root covers every column of the schema,
    /// * sum children share their parent's scope (smoothness),
    /// * product children have disjoint scopes (decomposability),
    /// * sum weights are non-negative and sum to one,
    /// * every leaf factor matches its column's type and has proper
    ///   parameters,
    /// * no node is deeper than [`MAX_CIRCUIT_DEPTH`].
    pub fn validate(&self) -> Result<(), CircuitError> {
        validate_nodes(&flatten(&self.root), &self.schema)
    }
}

/// Breadth-first iterator over the nodes of a circuit
pub struct Bfs<'a> {
    queue: VecDeque<(usize, &'a Node)>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.queue.pop_front()?;
        self.queue
            .extend(node.children().iter().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

fn validate_nodes(
    nodes: &[FlatNode],
    schema: &Schema,
) -> Result<(), CircuitError> {
    check_links(nodes)?;
    check_depth(nodes)?;

    let n_cols = schema.n_cols();
    let mut scopes: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (node_ix, node) in nodes.iter().enumerate().rev() {
        let scope = match node {
            FlatNode::Leaf(leaf) => {
                let mut scope = Vec::with_capacity(leaf.factors().len());
                for fx in leaf.factors() {
                    let col_ix = fx.column();
                    if col_ix >= n_cols {
                        return Err(CircuitError::ColumnOutOfBounds {
                            node_ix,
                            col_ix,
                            n_cols,
                        });
                    }
                    if scope.contains(&col_ix) {
                        return Err(CircuitError::DuplicateLeafColumn {
                            node_ix,
                            col_ix,
                        });
                    }
                    let expected = schema.coltype(col_ix);
                    if fx.kind() != expected {
                        return Err(CircuitError::LeafKindMismatch {
                            node_ix,
                            col_ix,
                            expected,
                            found: fx.kind(),
                        });
                    }
                    fx.validate().map_err(|source| {
                        CircuitError::InvalidLeafParams {
                            node_ix,
                            col_ix,
                            source,
                        }
                    })?;
                    scope.push(col_ix);
                }
                scope.sort_unstable();
                scope
            }
            FlatNode::Sum { children, weights } => {
                if children.len() != weights.len() {
                    return Err(CircuitError::WeightCountMismatch {
                        node_ix,
                        n_children: children.len(),
                        n_weights: weights.len(),
                    });
                }
                let sum: f64 = weights.iter().sum();
                let proper = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
                if !proper || (sum - 1.0).abs() > WEIGHT_SUM_TOL {
                    return Err(CircuitError::InvalidWeights { node_ix, sum });
                }
                let scope = scopes[children[0]].clone();
                if let Some(&child_ix) =
                    children.iter().find(|&&ix| scopes[ix] != scope)
                {
                    return Err(CircuitError::NotSmooth { node_ix, child_ix });
                }
                scope
            }
            FlatNode::Product { children } => {
                let mut scope: Vec<usize> = children
                    .iter()
                    .flat_map(|&ix| scopes[ix].iter().copied())
                    .collect();
                scope.sort_unstable();
                if let Some(pair) = scope.windows(2).find(|w| w[0] == w[1]) {
                    return Err(CircuitError::NotDecomposable {
                        node_ix,
                        col_ix: pair[0],
                    });
                }
                scope
            }
        };
        scopes[node_ix] = scope;
    }

    let root_scope = &scopes[0];
    if root_scope.len() != n_cols {
        return Err(CircuitError::IncompleteRootScope {
            n_scope: root_scope.len(),
            n_cols,
        });
    }
    Ok(())
}

// nodes are linked parent before child, so one forward pass sets every depth
fn check_depth(nodes: &[FlatNode]) -> Result<(), CircuitError> {
    let mut depths = vec![0_usize; nodes.len()];
    for (node_ix, node) in nodes.iter().enumerate() {
        let depth = depths[node_ix] + 1;
        for &child_ix in node.children() {
            if depth > MAX_CIRCUIT_DEPTH {
                return Err(CircuitError::TooDeep {
                    node_ix: child_ix,
                    depth,
                    max_depth: MAX_CIRCUIT_DEPTH,
                });
            }
            depths[child_ix] = depth;
        }
    }
    Ok(())
}

/// A decoded but not yet validated circuit
///
/// Deserialize into this when the structural error itself is wanted rather
/// than the format's error message, then convert with `Circuit::try_from`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedCircuit {
    schema: Schema,
    nodes: Vec<FlatNode>,
}

#[derive(Serialize)]
struct CircuitReprRef<'a> {
    schema: &'a Schema,
    nodes: Vec<FlatNode>,
}

impl Serialize for Circuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CircuitReprRef {
            schema: &self.schema,
            nodes: flatten(&self.root),
        }
        .serialize(serializer)
    }
}

impl TryFrom<SerializedCircuit> for Circuit {
    type Error = CircuitError;

    fn try_from(repr: SerializedCircuit) -> Result<Self, Self::Error> {
        validate_nodes(&repr.nodes, &repr.schema)?;
        let root = assemble(repr.nodes)?;
        Ok(Circuit::new_unchecked(repr.schema, root))
    }
}

//! Index-addressed node storage
//!
//! Nodes refer to their children by index, and a child always sits at a
//! higher index than its parent. The builder fills an arena level by level;
//! saved circuits use the same layout in breadth-first order.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::node::{Leaf, Node};
use crate::CircuitError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum FlatNode {
    Sum {
        children: Vec<usize>,
        weights: Vec<f64>,
    },
    Product {
        children: Vec<usize>,
    },
    Leaf(Leaf),
}

impl FlatNode {
    pub(crate) fn children(&self) -> &[usize] {
        match self {
            FlatNode::Sum { children, .. } | FlatNode::Product { children } => {
                children
            }
            FlatNode::Leaf(_) => &[],
        }
    }
}

/// Lay the tree out in breadth-first order
pub(crate) fn flatten(root: &Node) -> Vec<FlatNode> {
    let mut nodes = Vec::new();
    let mut queue = VecDeque::from([root]);
    let mut next_ix = 1;

    let mut child_ixs = |children: &[Node]| -> Vec<usize> {
        let ixs = (next_ix..next_ix + children.len()).collect();
        next_ix += children.len();
        ixs
    };

    while let Some(node) = queue.pop_front() {
        let flat = match node {
            Node::Sum { children, weights } => {
                queue.extend(children.iter());
                FlatNode::Sum {
                    children: child_ixs(children),
                    weights: weights.clone(),
                }
            }
            Node::Product { children } => {
                queue.extend(children.iter());
                FlatNode::Product {
                    children: child_ixs(children),
                }
            }
            Node::Leaf(leaf) => FlatNode::Leaf(leaf.clone()),
        };
        nodes.push(flat);
    }
    nodes
}

/// Check that the nodes form a single tree rooted at index 0
pub(crate) fn check_links(nodes: &[FlatNode]) -> Result<(), CircuitError> {
    if nodes.is_empty() {
        return Err(CircuitError::NoNodes);
    }

    let mut n_parents = vec![0_usize; nodes.len()];
    for (node_ix, node) in nodes.iter().enumerate() {
        if let FlatNode::Leaf(leaf) = node {
            if leaf.factors().is_empty() {
                return Err(CircuitError::EmptyLeaf { node_ix });
            }
            continue;
        }

        let children = node.children();
        if children.is_empty() {
            return Err(CircuitError::NoChildren { node_ix });
        }
        for &child_ix in children {
            if child_ix <= node_ix || child_ix >= nodes.len() {
                return Err(CircuitError::InvalidChildIndex {
                    node_ix,
                    child_ix,
                });
            }
            n_parents[child_ix] += 1;
            if n_parents[child_ix] > 1 {
                return Err(CircuitError::SharedChild { node_ix: child_ix });
            }
        }
    }

    match n_parents.iter().skip(1).position(|&n| n == 0) {
        Some(ix) => Err(CircuitError::Unreachable { node_ix: ix + 1 }),
        None => Ok(()),
    }
}

fn take_children(
    built: &mut [Option<Node>],
    ixs: &[usize],
) -> Result<Vec<Node>, CircuitError> {
    ixs.iter()
        .map(|&ix| {
            built[ix]
                .take()
                .ok_or(CircuitError::SharedChild { node_ix: ix })
        })
        .collect()
}

/// Build the owned tree from linked nodes
pub(crate) fn assemble(nodes: Vec<FlatNode>) -> Result<Node, CircuitError> {
    check_links(&nodes)?;

    let mut built: Vec<Option<Node>> = (0..nodes.len()).map(|_| None).collect();

    // children have higher indices than their parents
    for (ix, flat) in nodes.into_iter().enumerate().rev() {
        let node = match flat {
            FlatNode::Sum { children, weights } => Node::Sum {
                children: take_children(&mut built, &children)?,
                weights,
            },
            FlatNode::Product { children } => Node::Product {
                children: take_children(&mut built, &children)?,
            },
            FlatNode::Leaf(leaf) => Node::Leaf(leaf),
        };
        built[ix] = Some(node);
    }

    built[0].take().ok_or(CircuitError::NoNodes)
}

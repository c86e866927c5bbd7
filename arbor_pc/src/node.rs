use arbor_data::DataPartition;
use arbor_stats::LeafModel;
use serde::{Deserialize, Serialize};

/// A node in a probabilistic circuit
///
/// Children are owned by their parent. A node's scope is the set of columns it
/// defines a distribution over.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Mixture of children over the same scope. One weight per child; the
    /// weights are non-negative and sum to one.
    Sum { children: Vec<Node>, weights: Vec<f64> },
    /// Factorization into children over disjoint scopes
    Product { children: Vec<Node> },
    Leaf(Leaf),
}

impl Node {
    /// The sorted columns this node covers
    pub fn scope(&self) -> Vec<usize> {
        match self {
            Node::Leaf(leaf) => leaf.scope(),
            Node::Sum { children, .. } => {
                children.first().map(Node::scope).unwrap_or_default()
            }
            Node::Product { children } => {
                let mut scope: Vec<usize> =
                    children.iter().flat_map(Node::scope).collect();
                scope.sort_unstable();
                scope
            }
        }
    }

    /// The direct children of this node. Empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Sum { children, .. } | Node::Product { children } => {
                children
            }
            Node::Leaf(_) => &[],
        }
    }

    pub fn is_sum(&self) -> bool {
        matches!(self, Node::Sum { .. })
    }

    pub fn is_product(&self) -> bool {
        matches!(self, Node::Product { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

/// Independent univariate factors over one or more columns
///
/// A leaf with several factors is the fully factorized distribution used
/// when a partition is too small or has no useful split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    factors: Vec<LeafModel>,
}

impl Leaf {
    /// Create a leaf from factors. Factors are ordered by column.
    pub fn new(mut factors: Vec<LeafModel>) -> Self {
        factors.sort_by_key(LeafModel::column);
        Leaf { factors }
    }

    /// Fit one factor per column of `partition`
    pub fn fit(partition: &DataPartition, alpha: f64, epsilon: f64) -> Self {
        let factors = partition
            .cols()
            .iter()
            .map(|&col_ix| LeafModel::fit(partition, col_ix, alpha, epsilon))
            .collect();
        Leaf::new(factors)
    }

    pub fn factors(&self) -> &[LeafModel] {
        &self.factors
    }

    /// The factor for column `col_ix`, if this leaf covers it
    pub fn factor(&self, col_ix: usize) -> Option<&LeafModel> {
        self.factors.iter().find(|fx| fx.column() == col_ix)
    }

    pub fn is_univariate(&self) -> bool {
        self.factors.len() == 1
    }

    pub fn scope(&self) -> Vec<usize> {
        self.factors.iter().map(LeafModel::column).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_data::{DataMatrix, Schema};

    fn leaf(cols: &[usize]) -> Node {
        let schema = Schema::from_category_counts(&[0, 0, 0, 0]).unwrap();
        let data =
            DataMatrix::new(schema, vec![vec![0.0, 1.0, 2.0, 3.0]]).unwrap();
        let partition = DataPartition::new(&data, vec![0], cols.to_vec());
        Node::Leaf(Leaf::fit(&partition, 1.0, 1E-6))
    }

    #[test]
    fn leaf_factors_are_sorted_by_column() {
        match leaf(&[3, 0, 2]) {
            Node::Leaf(leaf) => {
                assert_eq!(leaf.scope(), vec![0, 2, 3]);
                assert!(!leaf.is_univariate());
                assert_eq!(leaf.factor(2).map(|fx| fx.column()), Some(2));
                assert!(leaf.factor(1).is_none());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn product_scope_is_the_union() {
        let node = Node::Product {
            children: vec![leaf(&[2]), leaf(&[0, 3])],
        };
        assert_eq!(node.scope(), vec![0, 2, 3]);
        assert_eq!(node.children().len(), 2);
        assert!(node.is_product());
    }

    #[test]
    fn sum_scope_is_the_child_scope() {
        let node = Node::Sum {
            children: vec![leaf(&[1, 2]), leaf(&[1, 2])],
            weights: vec![0.5, 0.5],
        };
        assert_eq!(node.scope(), vec![1, 2]);
        assert!(node.is_sum());
        assert!(leaf(&[1]).children().is_empty());
    }
}

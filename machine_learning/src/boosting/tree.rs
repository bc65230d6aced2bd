use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A single decision tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal split node, rows with `value < threshold` go left and missing values follow
    /// `default_left`.
    Split {
        feature: usize,
        threshold: f32,
        default_left: bool,
        left: usize,
        right: usize,
        /// Loss reduction achieved by this split.
        gain: f64,
    },
    /// Leaf node with its (already shrunk) weight.
    Leaf(f64),
}

/// A regression tree, its root is the first node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Returns a new tree from its nodes.
    ///
    /// # Panics
    /// If `nodes` is empty.
    pub fn new(nodes: Vec<Node>) -> Self {
        assert!(!nodes.is_empty(), "a tree must have at least a root");
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Evaluates the tree on a single row of features.
    pub fn predict_row(&self, row: ArrayView1<f32>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                    ..
                } => {
                    let value = row[feature];
                    let go_left = if value.is_nan() {
                        default_left
                    } else {
                        value < threshold
                    };

                    idx = if go_left { left } else { right };
                }
            }
        }
    }

    /// Adds this tree's split gains and split counts per feature into the given buffers.
    pub fn accumulate_gain(&self, gains: &mut [f64], counts: &mut [usize]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = *node {
                gains[feature] += gain;
                counts[feature] += 1;
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn stump() -> RegressionTree {
        RegressionTree::new(vec![
            Node::Split {
                feature: 1,
                threshold: 0.5,
                default_left: false,
                left: 1,
                right: 2,
                gain: 3.0,
            },
            Node::Leaf(-1.0),
            Node::Leaf(1.0),
        ])
    }

    #[test]
    fn tree_routes_rows_by_threshold() {
        let tree = stump();
        assert_eq!(tree.predict_row(array![9.0, 0.2].view()), -1.0);
        assert_eq!(tree.predict_row(array![9.0, 0.5].view()), 1.0);
        assert_eq!(tree.predict_row(array![9.0, f32::NAN].view()), 1.0);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn tree_accumulates_gain_per_feature() {
        let mut gains = [0.0; 2];
        let mut counts = [0; 2];
        stump().accumulate_gain(&mut gains, &mut counts);

        assert_eq!(gains, [0.0, 3.0]);
        assert_eq!(counts, [0, 1]);
    }
}

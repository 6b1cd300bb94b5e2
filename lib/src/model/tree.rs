//! CART decision tree for classification (Gini impurity).
//!
//! Trees are stored as a flat node arena: node `0` is the root and split nodes
//! refer to their children by index. Leaves hold the class distribution of the
//! training samples that reached them, so a forest can average them.

use crate::model::ModelError;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of non-constant features examined per split.
    pub max_features: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class proportions, summing to 1.
        distribution: Vec<f64>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

struct Grower<'a, 'x> {
    x: ArrayView2<'x, f64>,
    y: &'a [usize],
    n_classes: usize,
    config: &'a TreeConfig,
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn sum_sq(counts: &[usize]) -> f64 {
    counts.iter().map(|&c| (c * c) as f64).sum()
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    1.0 - sum_sq(counts) / (n * n) as f64
}

impl<'a, 'x> Grower<'a, 'x> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let n = samples.len();
        let counts = self.class_counts(&samples);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if is_pure
            || depth >= self.config.max_depth
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
        {
            return self.push_leaf(&counts, n);
        }

        let split = match self.best_split(&samples, &counts, rng) {
            Some(split) => split,
            None => return self.push_leaf(&counts, n),
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);

        // Reserve the slot so the parent precedes its children.
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let left = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Best split over randomly drawn features.
    ///
    /// Features are visited in random order; constant ones do not count
    /// against `max_features`, so a split is found whenever one exists among
    /// the first `max_features` informative features.
    fn best_split(&self, samples: &[usize], parent: &[usize], rng: &mut StdRng) -> Option<Split> {
        let n = samples.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in features {
            if visited >= self.config.max_features {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column[0].0 == column[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.to_vec();
            for pos in 0..n - 1 {
                let (value, class) = column[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = column[pos + 1].0;
                let n_left = pos + 1;
                let n_right = n - n_left;
                if value == next || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    /// Fit a tree on the rows of `x` listed in `samples` (duplicates allowed,
    /// as produced by bootstrap sampling).
    ///
    /// Labels must already be validated to lie in `0..n_classes`.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            n_classes,
            config,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0, rng);
        Self {
            nodes: grower.nodes,
            n_features: x.ncols(),
            n_classes,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<&[f64], ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { distribution }) => return Ok(distribution),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => id = if row[*feature] <= *threshold { *left } else { *right },
                None => {
                    return Err(ModelError::CorruptParams(format!(
                        "node {} out of range",
                        id
                    )))
                }
            }
        }
    }

    /// Check the structure of a deserialized tree.
    ///
    /// Children must come after their parent, which also rules out cycles.
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
        if self.n_features != n_features || self.n_classes != n_classes {
            return Err(ModelError::CorruptParams(format!(
                "tree shape ({}, {}) does not match forest ({}, {})",
                self.n_features, self.n_classes, n_features, n_classes
            )));
        }
        if self.nodes.is_empty() {
            return Err(ModelError::CorruptParams("tree has no nodes".to_string()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features || threshold.is_nan() {
                        return Err(ModelError::CorruptParams(format!("node {} has an invalid split", id)));
                    }
                    if *left <= id || *right <= id || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(ModelError::CorruptParams(format!("node {} has invalid children", id)));
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(ModelError::CorruptParams(format!(
                            "leaf {} has {} classes, expected {}",
                            id,
                            distribution.len(),
                            n_classes
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

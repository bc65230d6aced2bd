use ndarray::ArrayView2;
use rayon::prelude::*;

use super::{
    loss::GradPair,
    tree::{Node, RegressionTree},
};

/// Splits whose loss reduction doesn't exceed this are discarded.
const MIN_SPLIT_GAIN: f64 = 1e-6;

/// Marks rows that don't belong to any node of the tree being grown.
const UNASSIGNED: usize = usize::MAX;

/// Per feature row indices sorted by ascending value, missing values left out.
///
/// Built once per fit and shared by every tree.
pub(super) struct ColumnIndex {
    sorted: Vec<Vec<u32>>,
}

impl ColumnIndex {
    pub(super) fn new(x: ArrayView2<f32>) -> Self {
        let sorted = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let column = x.column(f);
                let mut rows: Vec<u32> = (0..x.nrows() as u32)
                    .filter(|&r| !column[r as usize].is_nan())
                    .collect();

                rows.sort_by(|&a, &b| column[a as usize].total_cmp(&column[b as usize]));
                rows
            })
            .collect();

        Self { sorted }
    }
}

/// The tree shape and regularization parameters used while growing.
#[derive(Debug, Clone, Copy)]
pub(super) struct GrowParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub reg_alpha: f64,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
}

impl GrowParams {
    /// Soft thresholds the gradient sum by the L1 penalty.
    fn threshold_l1(&self, g: f64) -> f64 {
        if g > self.reg_alpha {
            g - self.reg_alpha
        } else if g < -self.reg_alpha {
            g + self.reg_alpha
        } else {
            0.0
        }
    }

    /// The structure score of a node with the given derivative sums.
    fn score(&self, stats: GradPair) -> f64 {
        let denom = stats.h + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }

        self.threshold_l1(stats.g).powi(2) / denom
    }

    /// The loss reduction of splitting a node scored `parent` into `left` and `right`.
    ///
    /// `None` if either child is lighter than `min_child_weight` or the reduction doesn't exceed
    /// `MIN_SPLIT_GAIN`.
    fn split_gain(&self, parent: f64, left: GradPair, right: GradPair) -> Option<f64> {
        if left.h < self.min_child_weight || right.h < self.min_child_weight {
            return None;
        }

        let gain = self.score(left) + self.score(right) - parent;
        (gain > MIN_SPLIT_GAIN).then_some(gain)
    }

    /// The shrunk optimal weight of a leaf with the given derivative sums.
    fn leaf_weight(&self, stats: GradPair) -> f64 {
        let denom = stats.h + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }

        -self.threshold_l1(stats.g) / denom * self.learning_rate
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    default_left: bool,
    gain: f64,
    left: GradPair,
    right: GradPair,
}

/// Tracks the best split of a single node while scanning a feature.
#[derive(Debug, Default, Clone, Copy)]
struct ScanState {
    acc: GradPair,
    first: Option<f32>,
    last: Option<f32>,
    best: Option<SplitCandidate>,
}

/// Grows regression trees with the exact greedy algorithm, one level at a time.
pub(super) struct TreeGrower<'a> {
    x: ArrayView2<'a, f32>,
    columns: &'a ColumnIndex,
    params: GrowParams,
}

impl<'a> TreeGrower<'a> {
    pub(super) fn new(
        x: ArrayView2<'a, f32>,
        columns: &'a ColumnIndex,
        params: GrowParams,
    ) -> Self {
        Self { x, columns, params }
    }

    /// Grows a single tree.
    ///
    /// # Arguments
    /// * `grads` - The loss derivatives of every row of `x`.
    /// * `rows` - The rows this tree is grown on.
    /// * `features` - The features this tree may split on.
    pub(super) fn grow(
        &self,
        grads: &[GradPair],
        rows: &[usize],
        features: &[usize],
    ) -> RegressionTree {
        let mut position = vec![UNASSIGNED; self.x.nrows()];
        let mut root = GradPair::default();
        for &r in rows {
            position[r] = 0;
            root += grads[r];
        }

        let mut nodes = vec![Node::Leaf(0.0)];
        let mut stats = vec![root];
        let mut frontier = vec![0];

        for _ in 0..self.params.max_depth {
            if frontier.is_empty() {
                break;
            }

            let splits = self.find_splits(&frontier, &position, &stats, grads, features);
            let mut next = Vec::with_capacity(frontier.len() * 2);

            for (&node, split) in frontier.iter().zip(splits) {
                let Some(split) = split else {
                    continue;
                };

                let left = nodes.len();
                let right = left + 1;
                nodes.extend([Node::Leaf(0.0), Node::Leaf(0.0)]);
                stats.extend([split.left, split.right]);

                nodes[node] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    default_left: split.default_left,
                    left,
                    right,
                    gain: split.gain,
                };

                next.extend([left, right]);
            }

            for &r in rows {
                if let Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                    ..
                } = nodes[position[r]]
                {
                    let value = self.x[[r, feature]];
                    let go_left = if value.is_nan() {
                        default_left
                    } else {
                        value < threshold
                    };

                    position[r] = if go_left { left } else { right };
                }
            }

            frontier = next;
        }

        for (node, &stat) in nodes.iter_mut().zip(&stats) {
            if let Node::Leaf(value) = node {
                *value = self.params.leaf_weight(stat);
            }
        }

        RegressionTree::new(nodes)
    }

    /// Finds the best split of every frontier node, `None` where no split improves the loss.
    fn find_splits(
        &self,
        frontier: &[usize],
        position: &[usize],
        stats: &[GradPair],
        grads: &[GradPair],
        features: &[usize],
    ) -> Vec<Option<SplitCandidate>> {
        let mut slot_of = vec![UNASSIGNED; stats.len()];
        for (slot, &node) in frontier.iter().enumerate() {
            slot_of[node] = slot;
        }

        let per_feature: Vec<Vec<Option<SplitCandidate>>> = features
            .par_iter()
            .map(|&f| self.scan_feature(f, frontier, &slot_of, position, stats, grads))
            .collect();

        let mut best: Vec<Option<SplitCandidate>> = vec![None; frontier.len()];
        for candidates in per_feature {
            for (best, candidate) in best.iter_mut().zip(candidates) {
                match (*best, candidate) {
                    (None, Some(c)) => *best = Some(c),
                    (Some(b), Some(c)) if c.gain > b.gain => *best = Some(c),
                    _ => {}
                }
            }
        }

        best
    }

    fn scan_feature(
        &self,
        feature: usize,
        frontier: &[usize],
        slot_of: &[usize],
        position: &[usize],
        stats: &[GradPair],
        grads: &[GradPair],
    ) -> Vec<Option<SplitCandidate>> {
        let sorted = &self.columns.sorted[feature];
        let column = self.x.column(feature);

        let slot = |r: usize| match position[r] {
            UNASSIGNED => None,
            node => Some(slot_of[node]).filter(|&s| s != UNASSIGNED),
        };

        let mut present = vec![GradPair::default(); frontier.len()];
        for &r in sorted {
            if let Some(s) = slot(r as usize) {
                present[s] += grads[r as usize];
            }
        }

        let mut states = vec![ScanState::default(); frontier.len()];
        for &r in sorted {
            let r = r as usize;
            let Some(s) = slot(r) else {
                continue;
            };

            let value = column[r];
            let state = &mut states[s];

            if let Some(last) = state.last.filter(|&last| value > last) {
                let mut threshold = last / 2.0 + value / 2.0;
                if threshold <= last {
                    threshold = value;
                }

                let total = stats[frontier[s]];
                self.evaluate(state, feature, threshold, total, present[s]);
            }

            state.acc += grads[r];
            state.first.get_or_insert(value);
            state.last = Some(value);
        }

        // Every present value on the right and every missing one on the left.
        for (s, state) in states.iter_mut().enumerate() {
            let total = stats[frontier[s]];
            let missing = total - present[s];

            let Some(min) = state.first.filter(|_| missing.h > 0.0) else {
                continue;
            };

            let parent = self.params.score(total);
            if let Some(gain) = self.params.split_gain(parent, missing, present[s]) {
                keep_best(
                    &mut state.best,
                    SplitCandidate {
                        feature,
                        threshold: min,
                        default_left: true,
                        gain,
                        left: missing,
                        right: present[s],
                    },
                );
            }
        }

        states.into_iter().map(|s| s.best).collect()
    }

    /// Scores splitting at `threshold` given the rows accumulated so far, with missing values
    /// sent to either side.
    fn evaluate(
        &self,
        state: &mut ScanState,
        feature: usize,
        threshold: f32,
        total: GradPair,
        present: GradPair,
    ) {
        let acc = state.acc;
        let missing = total - present;
        let parent = self.params.score(total);

        let mut consider = |left: GradPair, right: GradPair, default_left: bool| {
            if let Some(gain) = self.params.split_gain(parent, left, right) {
                keep_best(
                    &mut state.best,
                    SplitCandidate {
                        feature,
                        threshold,
                        default_left,
                        gain,
                        left,
                        right,
                    },
                );
            }
        };

        consider(acc, total - acc, false);
        if missing.h > 0.0 {
            consider(acc + missing, present - acc, true);
        }
    }
}

fn keep_best(best: &mut Option<SplitCandidate>, candidate: SplitCandidate) {
    if !best.is_some_and(|b| candidate.gain <= b.gain) {
        *best = Some(candidate);
    }
}

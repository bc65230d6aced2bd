use log::trace;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};

use super::{
    BoosterParams,
    grower::{ColumnIndex, GrowParams, TreeGrower},
    loss::{GradPair, LossFn, SquaredError},
    tree::RegressionTree,
};
use crate::error::{MlErr, Result};

/// An additive ensemble of regression trees fitted by gradient boosting on the squared error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBooster {
    params: BoosterParams,
    base_score: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBooster {
    /// Fits a new ensemble.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, one row per sample. `NaN` marks a missing value.
    /// * `y` - The target of every sample.
    /// * `params` - The hyperparameters of the ensemble.
    ///
    /// # Returns
    /// An error if the params are invalid or `x` and `y` don't hold the same amount of rows.
    pub fn fit(x: ArrayView2<f32>, y: ArrayView1<f32>, params: &BoosterParams) -> Result<Self> {
        params.validate()?;

        let (n, n_features) = x.dim();
        if y.len() != n {
            return Err(MlErr::SizeMismatch {
                a: "y",
                b: "x rows",
                got: y.len(),
                expected: n,
            });
        }
        if n == 0 || n_features == 0 {
            return Err(MlErr::EmptyDataset);
        }

        let loss = SquaredError::new();
        let base_score = loss.base_score(y);
        let columns = ColumnIndex::new(x);
        let grower = TreeGrower::new(
            x,
            &columns,
            GrowParams {
                max_depth: params.max_depth,
                learning_rate: params.learning_rate,
                reg_alpha: params.reg_alpha,
                reg_lambda: params.reg_lambda,
                min_child_weight: params.min_child_weight,
            },
        );

        let n_sampled_features =
            ((params.colsample_bytree * n_features as f64).floor() as usize).clamp(1, n_features);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut preds = vec![base_score; n];
        let mut grads = vec![GradPair::default(); n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            loss.gradients(&preds, y, &mut grads);

            let rows: Vec<usize> = if params.subsample < 1.0 {
                (0..n).filter(|_| rng.random_bool(params.subsample)).collect()
            } else {
                (0..n).collect()
            };

            let features = if n_sampled_features < n_features {
                let mut features =
                    index::sample(&mut rng, n_features, n_sampled_features).into_vec();
                features.sort_unstable();
                features
            } else {
                (0..n_features).collect()
            };

            let tree = grower.grow(&grads, &rows, &features);
            for (pred, row) in preds.iter_mut().zip(x.rows()) {
                *pred += tree.predict_row(row);
            }

            trace!("round {round}: {} leaves over {} rows", tree.n_leaves(), rows.len());
            trees.push(tree);
        }

        Ok(Self {
            params: *params,
            base_score,
            n_features,
            trees,
        })
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Predicts the target of a single row of features.
    ///
    /// # Returns
    /// An error if the row doesn't hold exactly `n_features` values.
    pub fn predict_row(&self, row: ArrayView1<f32>) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(MlErr::SizeMismatch {
                a: "row",
                b: "model features",
                got: row.len(),
                expected: self.n_features,
            });
        }

        Ok(self.raw_predict(row))
    }

    /// Predicts the target of every row of `x`.
    ///
    /// # Returns
    /// An error if `x` doesn't have exactly `n_features` columns.
    pub fn predict(&self, x: ArrayView2<f32>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(MlErr::SizeMismatch {
                a: "x columns",
                b: "model features",
                got: x.ncols(),
                expected: self.n_features,
            });
        }

        Ok(x.rows().into_iter().map(|row| self.raw_predict(row)).collect())
    }

    fn raw_predict(&self, row: ArrayView1<f32>) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    /// The average split gain of every feature, normalized to add up to one.
    ///
    /// Features the ensemble never splits on score zero, and so does every feature when there
    /// are no splits at all.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut gains = vec![0.0; self.n_features];
        let mut counts = vec![0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gain(&mut gains, &mut counts);
        }

        let averages: Vec<f64> = gains
            .iter()
            .zip(&counts)
            .map(|(&gain, &count)| if count == 0 { 0.0 } else { gain / count as f64 })
            .collect();

        let total: f64 = averages.iter().sum();
        if total <= 0.0 {
            return averages;
        }

        averages.into_iter().map(|a| a / total).collect()
    }
}

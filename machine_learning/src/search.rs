use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::index};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    boosting::{BoosterParams, GradientBooster},
    dataset::KFold,
    error::{MlErr, Result},
    metrics::rmse,
};

/// The values each hyperparameter may take during a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDistributions {
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
    pub subsample: Vec<f64>,
    pub colsample_bytree: Vec<f64>,
    pub reg_alpha: Vec<f64>,
    pub reg_lambda: Vec<f64>,
}

impl Default for ParamDistributions {
    fn default() -> Self {
        Self {
            n_estimators: vec![300, 500, 800],
            learning_rate: vec![0.01, 0.05, 0.1, 0.2],
            max_depth: vec![3, 5, 7, 9],
            subsample: vec![0.6, 0.8, 1.0],
            colsample_bytree: vec![0.6, 0.8, 1.0],
            reg_alpha: vec![0.0, 0.1, 1.0],
            reg_lambda: vec![0.5, 1.0, 2.0],
        }
    }
}

impl ParamDistributions {
    fn dims(&self) -> [(&'static str, usize); 7] {
        [
            ("n_estimators", self.n_estimators.len()),
            ("learning_rate", self.learning_rate.len()),
            ("max_depth", self.max_depth.len()),
            ("subsample", self.subsample.len()),
            ("colsample_bytree", self.colsample_bytree.len()),
            ("reg_alpha", self.reg_alpha.len()),
            ("reg_lambda", self.reg_lambda.len()),
        ]
    }

    /// The amount of distinct parameter combinations.
    pub fn grid_size(&self) -> usize {
        self.dims().iter().map(|(_, len)| len).product()
    }

    /// Decodes the `index`-th grid point, the last parameter varying fastest.
    fn point(&self, mut index: usize, base: &BoosterParams) -> BoosterParams {
        let mut digit = |len: usize| {
            let d = index % len;
            index /= len;
            d
        };

        let reg_lambda = self.reg_lambda[digit(self.reg_lambda.len())];
        let reg_alpha = self.reg_alpha[digit(self.reg_alpha.len())];
        let colsample_bytree = self.colsample_bytree[digit(self.colsample_bytree.len())];
        let subsample = self.subsample[digit(self.subsample.len())];
        let max_depth = self.max_depth[digit(self.max_depth.len())];
        let learning_rate = self.learning_rate[digit(self.learning_rate.len())];
        let n_estimators = self.n_estimators[digit(self.n_estimators.len())];

        BoosterParams {
            n_estimators,
            learning_rate,
            max_depth,
            subsample,
            colsample_bytree,
            reg_alpha,
            reg_lambda,
            ..*base
        }
    }

    /// Draws distinct grid points without replacement.
    ///
    /// # Arguments
    /// * `n_iter` - The amount of points to draw, capped at the grid size.
    /// * `seed` - The seed of the draw.
    /// * `base` - Provides every parameter the grid doesn't cover.
    ///
    /// # Returns
    /// An error if any parameter has no values.
    pub fn sample(
        &self,
        n_iter: usize,
        seed: u64,
        base: &BoosterParams,
    ) -> Result<Vec<BoosterParams>> {
        if let Some((name, _)) = self.dims().into_iter().find(|&(_, len)| len == 0) {
            return Err(MlErr::InvalidParam { name, value: 0.0 });
        }

        let size = self.grid_size();
        let mut rng = StdRng::seed_from_u64(seed);

        Ok(index::sample(&mut rng, size, n_iter.min(size))
            .into_iter()
            .map(|i| self.point(i, base))
            .collect())
    }
}

/// The cross validation outcome of a single candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: BoosterParams,
    /// Negative RMSE on each validation fold.
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

impl CandidateScore {
    fn new(params: BoosterParams, fold_scores: Vec<f64>) -> Self {
        let n = fold_scores.len() as f64;
        let mean_score = fold_scores.iter().sum::<f64>() / n;
        let std_score = (fold_scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        Self {
            params,
            fold_scores,
            mean_score,
            std_score,
        }
    }
}

/// Everything a finished search found.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
    /// The best candidate refit on the whole search input.
    pub best_estimator: GradientBooster,
}

impl SearchResult {
    pub fn best_params(&self) -> &BoosterParams {
        &self.candidates[self.best_index].params
    }

    pub fn best_score(&self) -> f64 {
        self.candidates[self.best_index].mean_score
    }
}

/// Randomized hyperparameter search scored by k-fold cross validated negative RMSE.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    distributions: ParamDistributions,
    base: BoosterParams,
    n_iter: usize,
    cv: KFold,
    seed: u64,
}

impl RandomizedSearch {
    /// Returns a new `RandomizedSearch`.
    ///
    /// # Arguments
    /// * `distributions` - The values to draw candidates from.
    /// * `base` - The parameters every candidate starts from, including the booster's seed.
    /// * `n_iter` - The amount of candidates.
    /// * `cv` - The amount of cross validation folds.
    /// * `seed` - The seed candidates are drawn with.
    pub fn new(
        distributions: ParamDistributions,
        base: BoosterParams,
        n_iter: usize,
        cv: usize,
        seed: u64,
    ) -> Result<Self> {
        if n_iter == 0 {
            return Err(MlErr::InvalidParam {
                name: "n_iter",
                value: 0.0,
            });
        }

        Ok(Self {
            distributions,
            base,
            n_iter,
            cv: KFold::new(cv)?,
            seed,
        })
    }

    /// Evaluates every candidate and refits the best one on all of `x` and `y`.
    ///
    /// Candidates are evaluated in parallel. Ties go to the candidate drawn first.
    pub fn fit(&self, x: ArrayView2<f32>, y: ArrayView1<f32>) -> Result<SearchResult> {
        if y.len() != x.nrows() {
            return Err(MlErr::SizeMismatch {
                a: "y",
                b: "x rows",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        let candidates = self.distributions.sample(self.n_iter, self.seed, &self.base)?;
        let folds: Vec<Fold> = self
            .cv
            .split(x.nrows())?
            .into_iter()
            .map(|(train, valid)| Fold::new(x, y, &train, &valid))
            .collect();

        info!(
            "fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let candidates = candidates
            .into_par_iter()
            .enumerate()
            .map(|(i, params)| {
                let scores = folds
                    .iter()
                    .map(|fold| fold.score(&params))
                    .collect::<Result<Vec<_>>>()?;

                let candidate = CandidateScore::new(params, scores);
                debug!(
                    "candidate {i}: {:?} scored {:.4} (+/- {:.4})",
                    candidate.params, candidate.mean_score, candidate.std_score
                );

                Ok(candidate)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best_index = 0;
        for (i, c) in candidates.iter().enumerate() {
            if c.mean_score > candidates[best_index].mean_score {
                best_index = i;
            }
        }

        let best = &candidates[best_index];
        info!("best candidate scored {:.4}: {:?}", best.mean_score, best.params);

        let best_estimator = GradientBooster::fit(x, y, &best.params)?;

        Ok(SearchResult {
            candidates,
            best_index,
            best_estimator,
        })
    }
}

/// A materialized cross validation fold.
struct Fold {
    x_train: Array2<f32>,
    y_train: Array1<f32>,
    x_valid: Array2<f32>,
    y_valid: Array1<f32>,
}

impl Fold {
    fn new(x: ArrayView2<f32>, y: ArrayView1<f32>, train: &[usize], valid: &[usize]) -> Self {
        Self {
            x_train: x.select(Axis(0), train),
            y_train: y.select(Axis(0), train),
            x_valid: x.select(Axis(0), valid),
            y_valid: y.select(Axis(0), valid),
        }
    }

    fn score(&self, params: &BoosterParams) -> Result<f64> {
        let model = GradientBooster::fit(self.x_train.view(), self.y_train.view(), params)?;
        let pred = model.predict(self.x_valid.view())?;
        Ok(-rmse(self.y_valid.view(), pred.view())?)
    }
}

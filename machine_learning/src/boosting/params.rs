use serde::{Deserialize, Serialize};

use crate::error::{MlErr, Result};

/// Hyperparameters of a [`GradientBooster`](super::GradientBooster).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Amount of boosting rounds, one tree each.
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf weight.
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of the rows each tree is grown on.
    pub subsample: f64,
    /// Fraction of the features each tree may split on.
    pub colsample_bytree: f64,
    /// L1 regularization on leaf weights.
    pub reg_alpha: f64,
    /// L2 regularization on leaf weights.
    pub reg_lambda: f64,
    /// Minimum hessian mass a child needs for a split to be taken.
    pub min_child_weight: f64,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            seed: 0,
        }
    }
}

impl BoosterParams {
    /// Checks every parameter is within its valid range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name, value| Err(MlErr::InvalidParam { name, value });

        if self.n_estimators == 0 {
            return invalid("n_estimators", 0.0);
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate", self.learning_rate);
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid("subsample", self.subsample);
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return invalid("colsample_bytree", self.colsample_bytree);
        }
        if !(self.reg_alpha >= 0.0) {
            return invalid("reg_alpha", self.reg_alpha);
        }
        if !(self.reg_lambda >= 0.0) {
            return invalid("reg_lambda", self.reg_lambda);
        }
        if !(self.min_child_weight >= 0.0) {
            return invalid("min_child_weight", self.min_child_weight);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BoosterParams::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let base = BoosterParams::default();

        for params in [
            BoosterParams { n_estimators: 0, ..base },
            BoosterParams { learning_rate: 0.0, ..base },
            BoosterParams { subsample: 1.5, ..base },
            BoosterParams { colsample_bytree: 0.0, ..base },
            BoosterParams { reg_alpha: -1.0, ..base },
            BoosterParams { reg_lambda: f64::NAN, ..base },
        ] {
            assert!(matches!(params.validate(), Err(MlErr::InvalidParam { .. })));
        }
    }
}

use std::{env, path::PathBuf};

use machine_learning::ParamDistributions;

/// The amount of most important features the final model is refit on.
pub const TOP_FEATURES: usize = 20;

const DEFAULT_DATASET_PATH: &str =
    "data/Solubility_data-1.0/Descriptors/water_set_narrow_descriptors.csv";
const DEFAULT_MODEL_PATH: &str = "models/xgboost_model.bin";

/// Everything the training pipeline needs to run.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    /// The column holding the log solubility.
    pub target: String,
    /// Identifier and metadata columns that are not descriptors.
    pub drop_columns: Vec<String>,
    pub test_size: f64,
    /// Seeds the split, the search and every booster.
    pub seed: u64,
    pub n_iter: usize,
    pub cv_folds: usize,
    pub top_features: usize,
    pub distributions: ParamDistributions,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.into(),
            model_path: DEFAULT_MODEL_PATH.into(),
            target: "LogS".to_string(),
            drop_columns: ["SMILES", "StdInChIKey", "Train_test"]
                .map(String::from)
                .to_vec(),
            test_size: 0.2,
            seed: 42,
            n_iter: 30,
            cv_folds: 3,
            top_features: TOP_FEATURES,
            distributions: ParamDistributions::default(),
        }
    }
}

impl TrainingConfig {
    /// The default config with its paths overridden by `DATASET_PATH` and `MODEL_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("DATASET_PATH") {
            config.dataset_path = path.into();
        }
        if let Ok(path) = env::var("MODEL_PATH") {
            config.model_path = path.into();
        }

        config
    }

    pub fn drop_columns(&self) -> Vec<&str> {
        self.drop_columns.iter().map(String::as_str).collect()
    }
}

use anyhow::Context;
use log::{debug, info};
use machine_learning::{
    Artifact, BoosterParams, Dataset, GradientBooster, RandomizedSearch,
    metrics::{mae, r2, rmse},
    selection::rank_features,
    train_test_split,
};

use crate::config::TrainingConfig;

/// What a training run produced, besides the artifact.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best_params: BoosterParams,
    /// Mean cross validated RMSE of the best candidate.
    pub best_cv_rmse: f64,
    /// The kept features with their importance in the searched model, most important first.
    pub top_features: Vec<(String, f64)>,
    pub test_rmse: f64,
    pub test_mae: f64,
    pub test_r2: f64,
}

/// Fits, selects and saves a solubility model.
///
/// The steps are:
/// 1. Load the dataset, dropping the identifier columns.
/// 2. Split it in a train and test partition.
/// 3. Run a randomized search over the booster's hyperparameters on the train partition.
/// 4. Rank the features by the best estimator's importances and keep the top ones.
/// 5. Refit the best params on the kept features.
/// 6. Evaluate the refit model on the test partition.
/// 7. Save the kept features and the refit model.
///
/// # Errors
/// Any failure aborts the run before the artifact is written.
pub fn run(config: &TrainingConfig) -> anyhow::Result<TrainingReport> {
    info!("loading dataset from {}", config.dataset_path.display());
    let dataset = Dataset::from_csv(&config.dataset_path, &config.target, &config.drop_columns())
        .with_context(|| format!("failed to load {}", config.dataset_path.display()))?;

    let (train, test) = train_test_split(&dataset, config.test_size, config.seed)
        .context("failed to split the dataset")?;
    info!(
        "{} features, {} train rows, {} test rows",
        dataset.n_features(),
        train.len(),
        test.len()
    );

    let base = BoosterParams {
        seed: config.seed,
        ..Default::default()
    };
    let search = RandomizedSearch::new(
        config.distributions.clone(),
        base,
        config.n_iter,
        config.cv_folds,
        config.seed,
    )?;
    let result = search
        .fit(train.x(), train.y())
        .context("hyperparameter search failed")?;

    let importances = result.best_estimator.feature_importances();
    let top: Vec<(String, f64)> = rank_features(train.features(), &importances)
        .into_iter()
        .take(config.top_features)
        .collect();

    for (name, importance) in &top {
        debug!("{name}: {importance:.4}");
    }

    let names: Vec<String> = top.iter().map(|(name, _)| name.clone()).collect();
    let train_top = train.select_features(&names)?;
    let test_top = test.select_features(&names)?;

    info!("refitting on the top {} features", names.len());
    let model = GradientBooster::fit(train_top.x(), train_top.y(), result.best_params())
        .context("failed to refit on the top features")?;

    let pred = model.predict(test_top.x())?;
    let report = TrainingReport {
        best_params: *result.best_params(),
        best_cv_rmse: -result.best_score(),
        top_features: top,
        test_rmse: rmse(test_top.y(), pred.view())?,
        test_mae: mae(test_top.y(), pred.view())?,
        test_r2: r2(test_top.y(), pred.view())?,
    };

    info!(
        "test rmse {:.4}, mae {:.4}, r2 {:.4}",
        report.test_rmse, report.test_mae, report.test_r2
    );

    Artifact::new(names, model)?
        .save(&config.model_path)
        .with_context(|| format!("failed to save {}", config.model_path.display()))?;

    Ok(report)
}

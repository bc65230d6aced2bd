use log::info;

use trainer::{TrainingConfig, pipeline};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = TrainingConfig::from_env();
    let report = pipeline::run(&config)?;

    info!(
        "best cv rmse {:.4} with {:?}",
        report.best_cv_rmse, report.best_params
    );
    info!("model written to {}", config.model_path.display());

    Ok(())
}

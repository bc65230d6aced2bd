use anyhow::Context;
use log::info;
use tokio::{net::TcpListener, signal};

use server::{AppState, Predictor, ServerConfig, create_router, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let predictor = Predictor::load(&config.model_path)
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;
    info!(
        "loaded model over {} features from {}",
        predictor.features().len(),
        config.model_path.display()
    );

    let app = create_router(AppState::new(predictor));
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::on_signal(signal::ctrl_c()))
        .await?;

    Ok(())
}

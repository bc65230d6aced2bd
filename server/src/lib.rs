pub mod config;
pub mod error;
pub mod handlers;
pub mod predictor;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use config::ServerConfig;
pub use error::PredictError;
pub use predictor::{Prediction, Predictor};
pub use routes::create_router;
pub use state::AppState;

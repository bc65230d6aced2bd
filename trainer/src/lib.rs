pub mod config;
pub mod pipeline;

pub use config::TrainingConfig;
pub use pipeline::TrainingReport;

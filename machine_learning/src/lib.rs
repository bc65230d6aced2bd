pub mod artifact;
pub mod boosting;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod search;
pub mod selection;
mod test;

pub use artifact::Artifact;
pub use boosting::{BoosterParams, GradientBooster};
pub use dataset::{Dataset, KFold, train_test_split};
pub use error::{MlErr, Result};
pub use search::{ParamDistributions, RandomizedSearch, SearchResult};

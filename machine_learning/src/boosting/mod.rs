mod booster;
mod grower;
pub mod loss;
mod params;
mod tree;

pub use booster::GradientBooster;
pub use loss::{LossFn, SquaredError};
pub use params::BoosterParams;
pub use tree::{Node, RegressionTree};

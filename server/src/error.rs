use std::{error::Error, fmt};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use machine_learning::MlErr;
use serde_json::json;

/// Why a prediction request could not be answered.
#[derive(Debug)]
pub enum PredictError {
    /// The request lacks these features, in model order.
    MissingFeatures(Vec<String>),
    /// The value given for this feature isn't a number.
    InvalidFeatureValue { feature: String },
    /// The model rejected the row.
    Model(MlErr),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFeatures(missing) => write!(f, "missing features: {}", missing.join(", ")),
            Self::InvalidFeatureValue { feature } => {
                write!(f, "value of feature {feature:?} is not a number")
            }
            Self::Model(e) => write!(f, "model error: {e}"),
        }
    }
}

impl Error for PredictError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for PredictError {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingFeatures(missing) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "missing_features", "missing": missing }),
            ),
            Self::InvalidFeatureValue { feature } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "invalid_feature_value", "feature": feature }),
            ),
            Self::Model(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "prediction_failed" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

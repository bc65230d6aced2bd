use std::path::Path;

use machine_learning::{Artifact, GradientBooster};
use ndarray::Array1;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PredictError;

/// Log solubility at or above which a compound counts as soluble.
pub const SOLUBILITY_THRESHOLD: f64 = -2.0;

/// The answer to a prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted log solubility, rounded to two decimals.
    pub predicted_solubility: f64,
    pub soluble: bool,
}

impl Prediction {
    /// Rounds the model output and classifies it, the classification uses the unrounded value.
    pub fn from_raw(raw: f64) -> Self {
        Self {
            predicted_solubility: (raw * 100.0).round_ties_even() / 100.0,
            soluble: raw >= SOLUBILITY_THRESHOLD,
        }
    }
}

/// The loaded model and the ordered features its rows are built from.
///
/// Immutable once built, shared by every request.
#[derive(Debug)]
pub struct Predictor {
    features: Vec<String>,
    model: GradientBooster,
}

impl Predictor {
    /// Returns a new `Predictor`.
    ///
    /// # Errors
    /// If the model wasn't fitted on exactly these features.
    pub fn new(features: Vec<String>, model: GradientBooster) -> machine_learning::Result<Self> {
        Ok(Self::from(Artifact::new(features, model)?))
    }

    /// Loads the artifact written by the trainer.
    pub fn load<P: AsRef<Path>>(path: P) -> machine_learning::Result<Self> {
        Ok(Self::from(Artifact::load(path)?))
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The features absent from `input`, in model order.
    pub fn missing_features(&self, input: &Map<String, Value>) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| !input.contains_key(f.as_str()))
            .cloned()
            .collect()
    }

    /// Predicts the solubility of the compound described by `input`.
    ///
    /// Keys that aren't model features are ignored.
    ///
    /// # Errors
    /// If any feature is missing or any feature value can't be read as a number.
    pub fn predict(&self, input: &Map<String, Value>) -> Result<Prediction, PredictError> {
        let missing = self.missing_features(input);
        if !missing.is_empty() {
            return Err(PredictError::MissingFeatures(missing));
        }

        let row = self
            .features
            .iter()
            .map(|name| {
                to_number(&input[name.as_str()])
                    .map(|v| v as f32)
                    .ok_or_else(|| PredictError::InvalidFeatureValue {
                        feature: name.clone(),
                    })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let raw = self.model.predict_row(Array1::from(row).view())?;
        Ok(Prediction::from_raw(raw))
    }
}

impl From<Artifact> for Predictor {
    fn from(artifact: Artifact) -> Self {
        let (features, model) = artifact.into_parts();
        Self { features, model }
    }
}

/// Reads a JSON value as a number the way a lenient float conversion would: numbers as is,
/// booleans as one or zero and numeric strings parsed.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::BoosterParams;
    use ndarray::array;
    use serde_json::json;

    use super::*;

    fn constant_predictor(value: f32) -> Predictor {
        let x = array![[180.0f32, 1.2], [250.0, 3.4]];
        let y = array![value, value];
        let model = GradientBooster::fit(x.view(), y.view(), &BoosterParams::default()).unwrap();

        Predictor::new(vec!["MolWeight".into(), "LogP".into()], model).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn rounding_and_classification() {
        assert_eq!(
            Prediction::from_raw(-1.23456),
            Prediction {
                predicted_solubility: -1.23,
                soluble: true
            }
        );
        assert!(Prediction::from_raw(-2.0).soluble);

        let just_below = Prediction::from_raw(-2.004);
        assert_eq!(just_below.predicted_solubility, -2.0);
        assert!(!just_below.soluble);
    }

    #[test]
    fn numbers_are_read_leniently() {
        assert_eq!(to_number(&json!(1.5)), Some(1.5));
        assert_eq!(to_number(&json!(3)), Some(3.0));
        assert_eq!(to_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(to_number(&json!(true)), Some(1.0));
        assert!(to_number(&json!("nan")).unwrap().is_nan());
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!(null)), None);
        assert_eq!(to_number(&json!([1.0])), None);
    }

    #[test]
    fn missing_features_follow_model_order() {
        let predictor = constant_predictor(-3.0);

        let err = predictor.predict(&object(json!({ "Other": 1 }))).unwrap_err();
        assert!(matches!(err, PredictError::MissingFeatures(m) if m == ["MolWeight", "LogP"]));

        let err = predictor.predict(&object(json!({ "LogP": 1 }))).unwrap_err();
        assert!(matches!(err, PredictError::MissingFeatures(m) if m == ["MolWeight"]));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let predictor = constant_predictor(-3.0);
        let err = predictor
            .predict(&object(json!({ "MolWeight": "heavy", "LogP": 1.2 })))
            .unwrap_err();

        assert!(matches!(
            err,
            PredictError::InvalidFeatureValue { feature } if feature == "MolWeight"
        ));
    }

    #[test]
    fn complete_input_is_predicted() {
        let predictor = constant_predictor(-3.0);
        let prediction = predictor
            .predict(&object(json!({ "MolWeight": 180.0, "LogP": "1.2", "Extra": [] })))
            .unwrap();

        assert_eq!(
            prediction,
            Prediction {
                predicted_solubility: -3.0,
                soluble: false
            }
        );
    }

    #[test]
    fn predictor_requires_matching_features() {
        let x = array![[1.0f32], [2.0]];
        let y = array![1.0f32, 2.0];
        let model = GradientBooster::fit(x.view(), y.view(), &BoosterParams::default()).unwrap();

        assert!(Predictor::new(vec!["MolWeight".into(), "LogP".into()], model).is_err());
    }
}

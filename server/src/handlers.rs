use std::collections::BTreeMap;

use axum::{Json, body::Bytes, extract::State};
use log::{debug, warn};
use serde_json::{Map, Value, json, value::RawValue};

use crate::{
    error::PredictError,
    predictor::Prediction,
    state::AppState,
};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Prediction>, PredictError> {
    let input = parse_body(&body);

    match state.predictor.predict(&input) {
        Ok(prediction) => Ok(Json(prediction)),
        Err(e) => {
            match &e {
                PredictError::MissingFeatures(missing) => {
                    debug!("rejected request missing {missing:?}")
                }
                other => warn!("prediction failed: {other}"),
            }
            Err(e)
        }
    }
}

/// Reads the body as a JSON object regardless of its content type. Anything that isn't a JSON
/// object reads as an empty one.
fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(_) => parse_fields(body).unwrap_or_default(),
    }
}

/// Reads a JSON object one field at a time. Values `Value` can't hold, such as numbers beyond
/// the `f64` range, are kept as their source text.
fn parse_fields(body: &[u8]) -> Option<Map<String, Value>> {
    let fields: BTreeMap<String, Box<RawValue>> = serde_json::from_slice(body).ok()?;

    Some(
        fields
            .into_iter()
            .map(|(name, raw)| {
                let value = serde_json::from_str(raw.get())
                    .unwrap_or_else(|_| Value::String(raw.get().to_string()));
                (name, value)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_parsing_is_lenient() {
        assert_eq!(parse_body(br#"{"LogP": 1.0}"#).len(), 1);
        assert!(parse_body(b"{not json").is_empty());
        assert!(parse_body(b"[1, 2]").is_empty());
        assert!(parse_body(b"").is_empty());
    }

    #[test]
    fn out_of_range_numbers_keep_their_field() {
        let input = parse_body(br#"{"MolWeight": 1e400, "LogP": 1.2, "Other": [-1e400]}"#);

        assert_eq!(input.len(), 3);
        assert_eq!(input["MolWeight"], Value::String("1e400".into()));
        assert_eq!(input["LogP"], json!(1.2));
    }
}

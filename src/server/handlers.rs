//! HTTP request handlers

use std::collections::BTreeMap;
use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::inference::sample_profile;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Predict every target for the posted feature object
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<BTreeMap<String, f64>>> {
    let Json(body) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let record = match body {
        Value::Object(map) => map,
        other => {
            return Err(ServerError::BadRequest(format!(
                "Expected a JSON object of features, got {}",
                json_kind(&other)
            )))
        }
    };

    debug!(features = record.len(), "Predict request");
    let predictions = state.predictor.predict(&record)?;
    Ok(Json(predictions))
}

/// Predict for the built-in sample profile
pub async fn diet_with_model(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let predictions = state.predictor.predict(&sample_profile())?;
    Ok(Json(json!({ "reply": predictions })))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "targets": state.predictor.targets(),
    }))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

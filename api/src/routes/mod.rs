pub mod candles;
pub mod params;
pub mod signals;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::InstrumentId;

use crate::error::ApiError;
use crate::state::AppState;

/// Every endpoint, still waiting for its state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(candles::routes())
        .merge(signals::routes())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Decodes a JSON request body regardless of its `Content-Type`.
pub(crate) fn json_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ApiError> {
    let bytes = body.map_err(ApiError::unreadable_body)?;
    serde_json::from_slice(&bytes).map_err(ApiError::invalid_json)
}

/// Write paths reject unknown symbols with 400; a failing lookup query is still a 500.
pub(crate) async fn resolve_instrument(
    state: &AppState,
    symbol: &str,
) -> Result<InstrumentId, ApiError> {
    state
        .store
        .instrument_id(symbol)
        .await
        .map_err(ApiError::store("query error"))?
        .ok_or_else(|| {
            ApiError::bad_request_with("invalid symbol", format!("unknown symbol: {symbol}"))
        })
}

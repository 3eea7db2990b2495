use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shared::{Candle, UpsertSummary};
use tracing::info;

use super::params::{non_empty, parse_limit, parse_timestamp, QueryParams};
use super::{json_body, resolve_instrument};
use crate::error::ApiError;
use crate::state::AppState;

pub const LATEST_DEFAULT_LIMIT: i64 = 200;
pub const LATEST_MAX_LIMIT: i64 = 1000;

/// Body cap for `/candles/upsert`, roughly 350k one-minute bars per batch.
pub const UPSERT_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    symbol: Option<String>,
    candles: Option<Vec<Candle>>,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    status: &'static str,
    symbol: String,
    #[serde(flatten)]
    summary: UpsertSummary,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/candles/latest", get(latest_candles))
        .route("/candles/range", get(candle_range))
        .route(
            "/candles/upsert",
            post(upsert_candles).layer(DefaultBodyLimit::max(UPSERT_BODY_LIMIT)),
        )
}

/// Most recent candles for a symbol, returned oldest first for charting.
async fn latest_candles(
    State(state): State<AppState>,
    q: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Vec<Candle>>, ApiError> {
    let Query(q) = q.map_err(ApiError::invalid_query)?;
    let symbol = q
        .required("symbol")
        .ok_or_else(|| ApiError::bad_request("symbol is required"))?;
    let limit = parse_limit(q.first("limit"), LATEST_DEFAULT_LIMIT, LATEST_MAX_LIMIT);

    let mut candles = state
        .store
        .recent_candles(&symbol, limit)
        .await
        .map_err(ApiError::store("query error"))?;
    candles.reverse();

    Ok(Json(candles))
}

async fn candle_range(
    State(state): State<AppState>,
    q: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Vec<Candle>>, ApiError> {
    let Query(q) = q.map_err(ApiError::invalid_query)?;
    let (Some(symbol), Some(from), Some(to)) =
        (q.required("symbol"), q.required("from"), q.required("to"))
    else {
        return Err(ApiError::bad_request("symbol, from, to are required"));
    };

    let (Some(from), Some(to)) = (parse_timestamp(&from), parse_timestamp(&to)) else {
        return Err(ApiError::bad_request_with(
            "invalid time format",
            "use RFC3339, e.g. 2024-01-02T15:04:05Z",
        ));
    };
    if to <= from {
        return Err(ApiError::bad_request_with("invalid range", "to must be after from"));
    }

    let candles = state
        .store
        .candles_between(&symbol, from, to)
        .await
        .map_err(ApiError::store("query error"))?;

    Ok(Json(candles))
}

/// Idempotent bulk insert: candles whose timestamp already exists for the instrument are
/// skipped.
async fn upsert_candles(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<UpsertResponse>), ApiError> {
    let body: UpsertRequest = json_body(body)?;

    let symbol =
        non_empty(body.symbol).ok_or_else(|| ApiError::bad_request("symbol is required"))?;
    let candles = body
        .candles
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("candles array is required"))?;

    let instrument = resolve_instrument(&state, &symbol).await?;
    let inserted = state
        .store
        .insert_candles(instrument, &candles)
        .await
        .map_err(ApiError::store("batch insert error"))?;

    let summary = UpsertSummary {
        received: candles.len(),
        inserted,
    };
    info!(
        symbol = %symbol,
        received = summary.received,
        inserted = summary.inserted,
        "candles upserted"
    );

    Ok((
        StatusCode::CREATED,
        Json(UpsertResponse {
            status: "ok",
            symbol,
            summary,
        }),
    ))
}

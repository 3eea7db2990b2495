use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::{NewSignal, Signal, SignalAction};
use tracing::info;

use super::params::{non_empty, parse_limit, QueryParams};
use super::{json_body, resolve_instrument};
use crate::error::ApiError;
use crate::state::AppState;

pub const SIGNALS_DEFAULT_LIMIT: i64 = 50;
pub const SIGNALS_MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct CreateSignalRequest {
    symbol: Option<String>,
    action: Option<String>,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
    confidence: Option<f64>,
    pnl: Option<f64>,
    chart_screenshot: Option<String>,
    reason: Option<String>,
}

impl CreateSignalRequest {
    fn validate(self) -> Result<NewSignal, ApiError> {
        let symbol = non_empty(self.symbol)
            .ok_or_else(|| ApiError::bad_request("symbol is required"))?;
        let action: SignalAction = self
            .action
            .unwrap_or_default()
            .parse()
            .map_err(|e: shared::ParseSignalActionError| {
                ApiError::bad_request_with("invalid action", e.to_string())
            })?;

        Ok(NewSignal {
            symbol,
            action,
            take_profit: self.take_profit,
            stop_loss: self.stop_loss,
            confidence: self.confidence,
            pnl: self.pnl,
            chart_screenshot: self.chart_screenshot,
            reason: self.reason,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/signals", get(list_signals).post(create_signal))
}

async fn list_signals(
    State(state): State<AppState>,
    q: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Vec<Signal>>, ApiError> {
    let Query(q) = q.map_err(ApiError::invalid_query)?;
    let symbol = q
        .required("symbol")
        .ok_or_else(|| ApiError::bad_request("symbol is required"))?;
    let limit = parse_limit(q.first("limit"), SIGNALS_DEFAULT_LIMIT, SIGNALS_MAX_LIMIT);

    let signals = state
        .store
        .recent_signals(&symbol, limit)
        .await
        .map_err(ApiError::store("query error"))?;

    Ok(Json(signals))
}

async fn create_signal(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Signal>), ApiError> {
    let body: CreateSignalRequest = json_body(body)?;
    let signal = body.validate()?;

    let instrument = resolve_instrument(&state, &signal.symbol).await?;
    let created = state
        .store
        .insert_signal(instrument, signal)
        .await
        .map_err(ApiError::store("insert error"))?;

    info!(id = created.id, symbol = %created.symbol, action = %created.action, "signal recorded");
    Ok((StatusCode::CREATED, Json(created)))
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// One OHLCV bar. No relationship between the prices is enforced, and an omitted price or
/// volume reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Buy,
    Sell,
    Wait,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "buy",
            SignalAction::Sell => "sell",
            SignalAction::Wait => "wait",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("must be one of buy, sell, wait")]
pub struct ParseSignalActionError(pub String);

impl FromStr for SignalAction {
    type Err = ParseSignalActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(SignalAction::Buy),
            "sell" => Ok(SignalAction::Sell),
            "wait" => Ok(SignalAction::Wait),
            other => Err(ParseSignalActionError(other.to_string())),
        }
    }
}

/// A validated signal waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSignal {
    pub symbol: String,
    pub action: SignalAction,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub confidence: Option<f64>,
    pub pnl: Option<f64>,
    pub chart_screenshot: Option<String>,
    pub reason: Option<String>,
}

impl NewSignal {
    /// Completes the record with the values assigned by the store.
    pub fn into_signal(self, id: i64, created_at: DateTime<Utc>) -> Signal {
        Signal {
            id,
            symbol: self.symbol,
            action: self.action,
            take_profit: self.take_profit,
            stop_loss: self.stop_loss,
            confidence: self.confidence,
            pnl: self.pnl,
            chart_screenshot: self.chart_screenshot,
            reason: self.reason,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: i64,
    pub symbol: String,
    pub action: SignalAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Signal {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let action: String = row.try_get("action")?;
        let action = action.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "action".to_string(),
            source: Box::new(e),
        })?;

        Ok(Signal {
            id: row.try_get("id")?,
            symbol: row.try_get("symbol")?,
            action,
            take_profit: row.try_get("take_profit")?,
            stop_loss: row.try_get("stop_loss")?,
            confidence: row.try_get("confidence")?,
            pnl: row.try_get("pnl")?,
            chart_screenshot: row.try_get("chart_screenshot")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub received: usize,
    pub inserted: u64,
}

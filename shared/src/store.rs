//! Data access seam between the HTTP layer and the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{Candle, NewSignal, Signal};

pub type InstrumentId = i64;

/// Everything the HTTP handlers need from storage.
///
/// Read methods take a symbol and silently return nothing for unknown instruments.
/// Write methods take an already resolved [`InstrumentId`]; resolve it first with
/// [`MarketStore::instrument_id`].
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// `None` when no instrument carries this symbol.
    async fn instrument_id(&self, symbol: &str) -> StoreResult<Option<InstrumentId>>;

    /// Up to `limit` candles, newest first.
    async fn recent_candles(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Candle>>;

    /// Candles with `from <= ts <= to`, oldest first.
    async fn candles_between(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Candle>>;

    /// Inserts the whole batch as one unit, skipping `(instrument, ts)` pairs that already
    /// exist. Returns the number of rows actually written.
    async fn insert_candles(
        &self,
        instrument: InstrumentId,
        candles: &[Candle],
    ) -> StoreResult<u64>;

    /// Up to `limit` signals, most recently created first.
    async fn recent_signals(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Signal>>;

    async fn insert_signal(
        &self,
        instrument: InstrumentId,
        signal: NewSignal,
    ) -> StoreResult<Signal>;
}

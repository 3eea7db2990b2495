use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::error::StoreResult;
use crate::models::{Candle, NewSignal, Signal};
use crate::store::{InstrumentId, MarketStore};

// Numeric columns are cast to float8 so NUMERIC-typed schemas still decode as f64.
const CANDLE_COLUMNS: &str = "t.ts, t.open::float8 AS open, t.high::float8 AS high, \
     t.low::float8 AS low, t.close::float8 AS close, t.volume::float8 AS volume";

const SIGNAL_COLUMNS: &str = "s.id::int8 AS id, i.symbol, s.action::text AS action, \
     s.take_profit::float8 AS take_profit, s.stop_loss::float8 AS stop_loss, \
     s.confidence::float8 AS confidence, s.pnl::float8 AS pnl, \
     s.chart_screenshot, s.reason, s.created_at";

/// [`MarketStore`] backed by the `market` schema in PostgreSQL.
#[derive(Clone)]
pub struct PgMarketStore {
    pool: PgPool,
}

impl PgMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn instrument_id(&self, symbol: &str) -> StoreResult<Option<InstrumentId>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id::int8 FROM market.instruments WHERE symbol = $1",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn recent_candles(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Candle>> {
        let sql = format!(
            "SELECT {CANDLE_COLUMNS}
             FROM market.timeframe_1m t
             JOIN market.instruments i ON i.id = t.instrument_id
             WHERE i.symbol = $1
             ORDER BY t.ts DESC
             LIMIT $2"
        );
        let candles = sqlx::query_as::<_, Candle>(&sql)
            .bind(symbol)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(candles)
    }

    async fn candles_between(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Candle>> {
        let sql = format!(
            "SELECT {CANDLE_COLUMNS}
             FROM market.timeframe_1m t
             JOIN market.instruments i ON i.id = t.instrument_id
             WHERE i.symbol = $1 AND t.ts BETWEEN $2 AND $3
             ORDER BY t.ts ASC"
        );
        let candles = sqlx::query_as::<_, Candle>(&sql)
            .bind(symbol)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(candles)
    }

    async fn insert_candles(
        &self,
        instrument: InstrumentId,
        candles: &[Candle],
    ) -> StoreResult<u64> {
        let mut ts = Vec::with_capacity(candles.len());
        let mut open = Vec::with_capacity(candles.len());
        let mut high = Vec::with_capacity(candles.len());
        let mut low = Vec::with_capacity(candles.len());
        let mut close = Vec::with_capacity(candles.len());
        let mut volume = Vec::with_capacity(candles.len());
        for c in candles {
            ts.push(c.ts);
            open.push(c.open);
            high.push(c.high);
            low.push(c.low);
            close.push(c.close);
            volume.push(c.volume);
        }

        // One statement for the whole batch: a single round trip, and either every new row
        // lands or none do.
        let result = sqlx::query(
            "INSERT INTO market.timeframe_1m (instrument_id, ts, open, high, low, close, volume)
             SELECT $1, c.ts, c.open, c.high, c.low, c.close, c.volume
             FROM UNNEST($2::timestamptz[], $3::float8[], $4::float8[],
                         $5::float8[], $6::float8[], $7::float8[])
                  AS c(ts, open, high, low, close, volume)
             ON CONFLICT (instrument_id, ts) DO NOTHING",
        )
        .bind(instrument)
        .bind(ts)
        .bind(open)
        .bind(high)
        .bind(low)
        .bind(close)
        .bind(volume)
        .execute(&self.pool)
        .await?;

        debug!(
            instrument,
            received = candles.len(),
            inserted = result.rows_affected(),
            "candle batch executed"
        );
        Ok(result.rows_affected())
    }

    async fn recent_signals(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Signal>> {
        let sql = format!(
            "SELECT {SIGNAL_COLUMNS}
             FROM market.signals s
             JOIN market.instruments i ON i.id = s.instrument_id
             WHERE i.symbol = $1
             ORDER BY s.created_at DESC
             LIMIT $2"
        );
        let signals = sqlx::query_as::<_, Signal>(&sql)
            .bind(symbol)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(signals)
    }

    async fn insert_signal(
        &self,
        instrument: InstrumentId,
        signal: NewSignal,
    ) -> StoreResult<Signal> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO market.signals
                 (instrument_id, action, take_profit, stop_loss, confidence, pnl,
                  chart_screenshot, reason)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id::int8, created_at",
        )
        .bind(instrument)
        .bind(signal.action.as_str())
        .bind(signal.take_profit)
        .bind(signal.stop_loss)
        .bind(signal.confidence)
        .bind(signal.pnl)
        .bind(signal.chart_screenshot.as_deref())
        .bind(signal.reason.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(signal.into_signal(id, created_at))
    }
}

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use api::{AppState, OriginPolicy};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use shared::{Candle, InstrumentId, MarketStore, NewSignal, Signal, StoreError, StoreResult};
use tower::ServiceExt;

#[derive(Default)]
struct Tables {
    instruments: HashMap<String, InstrumentId>,
    candles: BTreeMap<(InstrumentId, DateTime<Utc>), Candle>,
    signals: Vec<(InstrumentId, Signal)>,
}

/// In-memory stand-in for the `market` schema, unique on (instrument, ts) like the real table.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_instruments(symbols: &[&str]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut t = store.tables.lock().unwrap();
            for (i, symbol) in symbols.iter().enumerate() {
                t.instruments.insert(symbol.to_string(), i as InstrumentId + 1);
            }
        }
        Arc::new(store)
    }

    /// Makes every subsequent call fail the way a dropped connection would.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Lookups keep working; only inserts fail.
    pub fn fail_writes(&self) {
        self.failing_writes.store(true, Ordering::SeqCst);
    }

    pub fn candle_count(&self) -> usize {
        self.tables.lock().unwrap().candles.len()
    }

    pub fn signal_count(&self) -> usize {
        self.tables.lock().unwrap().signals.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(connection_reset())
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> StoreResult<()> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            Err(connection_reset())
        } else {
            Ok(())
        }
    }
}

fn connection_reset() -> StoreError {
    StoreError::from(sqlx::Error::Protocol(
        "connection reset by peer".to_string(),
    ))
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn instrument_id(&self, symbol: &str) -> StoreResult<Option<InstrumentId>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().instruments.get(symbol).copied())
    }

    async fn recent_candles(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Candle>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        let Some(&id) = t.instruments.get(symbol) else {
            return Ok(Vec::new());
        };
        Ok(t.candles
            .iter()
            .rev()
            .filter(|((inst, _), _)| *inst == id)
            .take(limit as usize)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn candles_between(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Candle>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        let Some(&id) = t.instruments.get(symbol) else {
            return Ok(Vec::new());
        };
        Ok(t.candles
            .range((id, from)..=(id, to))
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn insert_candles(
        &self,
        instrument: InstrumentId,
        candles: &[Candle],
    ) -> StoreResult<u64> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let mut inserted = 0;
        for c in candles {
            if let std::collections::btree_map::Entry::Vacant(slot) =
                t.candles.entry((instrument, c.ts))
            {
                slot.insert(c.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn recent_signals(&self, symbol: &str, limit: i64) -> StoreResult<Vec<Signal>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        let Some(&id) = t.instruments.get(symbol) else {
            return Ok(Vec::new());
        };
        let mut signals: Vec<Signal> = t
            .signals
            .iter()
            .filter(|(inst, _)| *inst == id)
            .map(|(_, s)| s.clone())
            .collect();
        signals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        signals.truncate(limit as usize);
        Ok(signals)
    }

    async fn insert_signal(
        &self,
        instrument: InstrumentId,
        signal: NewSignal,
    ) -> StoreResult<Signal> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let id = t.signals.len() as i64 + 1;
        let created_at = base_time() + Duration::seconds(id);
        let created = signal.into_signal(id, created_at);
        t.signals.push((instrument, created.clone()));
        Ok(created)
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn app_with(store: Arc<MemoryStore>) -> Router {
    api::app(AppState::new(store), OriginPolicy::AllowAny)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

/// POST without going through `serde_json::Value`, optionally without any `Content-Type`.
pub async fn post_bytes(
    app: &Router,
    uri: &str,
    body: Vec<u8>,
    content_type: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        req = req.header("content-type", content_type);
    }
    send(app, req.body(Body::from(body)).unwrap()).await
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn timestamps(candles: &Value) -> Vec<DateTime<Utc>> {
    candles
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["ts"].as_str().unwrap().parse().unwrap())
        .collect()
}

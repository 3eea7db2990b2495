pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod postgres;
pub mod store;

pub use config::{Config, LogFormat};
pub use database::{get_pool, DbPool};
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use postgres::PgMarketStore;
pub use store::{InstrumentId, MarketStore};

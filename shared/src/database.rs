use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Upper bound on establishing the pool and answering the first ping.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn get_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to database");

    let pool = tokio::time::timeout(CONNECT_TIMEOUT, connect(database_url))
        .await
        .context("timed out connecting to database")??;

    Ok(pool)
}

async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(database_url)
        .await
        .context("db connect error")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("db ping error")?;

    Ok(pool)
}

pub type DbPool = PgPool;

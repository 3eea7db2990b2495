use anyhow::{Context, Result};
use dotenv::dotenv;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Explicit CORS allow-list from `FRONTEND_ORIGINS`. `None` means every origin is accepted.
    pub frontend_origins: Option<Vec<String>>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .context("DATABASE_URL is required")?;

        Ok(Config {
            database_url,
            port: parse_port(std::env::var("PORT").ok().as_deref())?,
            frontend_origins: parse_origins(std::env::var("FRONTEND_ORIGINS").ok().as_deref()),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        })
    }
}

fn parse_port(raw: Option<&str>) -> Result<u16> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(v) => v
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got {v:?}")),
    }
}

/// Splits a comma-separated origin list. Returns `None` when nothing usable is left.
pub fn parse_origins(raw: Option<&str>) -> Option<Vec<String>> {
    let origins: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}

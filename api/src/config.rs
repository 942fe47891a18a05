use std::env;

use chrono::FixedOffset;
use thiserror::Error;

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub frontend_origins: Vec<String>,
    /// Offset of the experts' local clock, used for "today" and week boundaries
    pub local_offset: FixedOffset,
    /// Apply `migrations/*.sql` on startup
    pub run_migrations: bool,
    /// Sustained requests per second per client on bulk routes
    pub bulk_rate_per_second: u64,
    pub bulk_rate_burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let offset_hours: i32 = parse_var("LOCAL_UTC_OFFSET_HOURS", -3)?;
        let local_offset =
            FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| ConfigError::Invalid {
                name: "LOCAL_UTC_OFFSET_HOURS",
                value: offset_hours.to_string(),
            })?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            port: parse_var("PORT", 8080)?,
            frontend_origins: env::var("FRONTEND_URL")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            local_offset,
            run_migrations: parse_var("RUN_MIGRATIONS", false)?,
            bulk_rate_per_second: parse_var("BULK_RATE_PER_SECOND", 2)?,
            bulk_rate_burst: parse_var("BULK_RATE_BURST", 5)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
        }
        _ => Ok(default),
    }
}

/// Split a comma-separated origin list, dropping blanks and the `*` wildcard
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_splits_and_trims() {
        assert_eq!(
            parse_origins("http://localhost:5173, https://app.example.com ,"),
            vec!["http://localhost:5173", "https://app.example.com"]
        );
    }

    #[test]
    fn parse_origins_wildcard_means_any() {
        assert!(parse_origins("*").is_empty());
    }
}

//! # Service Configuration
//!
//! Read once from the environment at startup. Collaborator settings live in
//! `cadence_client::ClientConfig`; this covers the server itself.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cadence_schedule::{SlotConfig, SlotConfigError};

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                var: "CADENCE_LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("slot configuration: {0}")]
    Slots(#[from] SlotConfigError),
}

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` and the database URL, which
/// usually embeds a password.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres URL. `None` runs the store in memory only.
    pub database_url: Option<String>,
    /// Bearer token for `/v1`. `None` disables authentication.
    pub auth_token: Option<String>,
    /// Directory holding asset files, uploaded or generated.
    pub uploads_dir: PathBuf,
    pub sweep_interval: Duration,
    pub slots: SlotConfig,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("uploads_dir", &self.uploads_dir)
            .field("sweep_interval", &self.sweep_interval)
            .field("slots", &self.slots)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            auth_token: None,
            uploads_dir: PathBuf::from("./uploads"),
            sweep_interval: Duration::from_secs(60),
            slots: SlotConfig::default(),
            log_format: LogFormat::Text,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

/// Parse a comma-separated hour list such as `8,9,12`.
pub fn parse_hours(raw: &str) -> Result<Vec<u32>, ConfigError> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_var("CADENCE_PEAK_HOURS", s))
        .collect()
}

impl AppConfig {
    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => parse_var("PORT", &raw)?,
            None => defaults.port,
        };
        let sweep_secs: u64 = match var("CADENCE_SWEEP_INTERVAL_SECS") {
            Some(raw) => parse_var("CADENCE_SWEEP_INTERVAL_SECS", &raw)?,
            None => defaults.sweep_interval.as_secs(),
        };
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "CADENCE_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let horizon = match var("CADENCE_HORIZON_DAYS") {
            Some(raw) => parse_var("CADENCE_HORIZON_DAYS", &raw)?,
            None => defaults.slots.horizon_days,
        };
        let hours = match var("CADENCE_PEAK_HOURS") {
            Some(raw) => parse_hours(&raw)?,
            None => defaults.slots.peak_hours.clone(),
        };
        let offset = match var("CADENCE_UTC_OFFSET_HOURS") {
            Some(raw) => parse_var("CADENCE_UTC_OFFSET_HOURS", &raw)?,
            None => defaults.slots.utc_offset_hours,
        };

        Ok(Self {
            port,
            database_url: var("DATABASE_URL"),
            auth_token: var("CADENCE_AUTH_TOKEN"),
            uploads_dir: var("CADENCE_UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            sweep_interval: Duration::from_secs(sweep_secs),
            slots: SlotConfig::new(horizon, hours, offset)?,
            log_format: match var("CADENCE_LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => LogFormat::Text,
            },
        })
    }

    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.sweep_interval, Duration::from_secs(60));
        assert_eq!(cfg.slots, SlotConfig::default());
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/cadence"),
            ("CADENCE_AUTH_TOKEN", "tok"),
            ("CADENCE_UPLOADS_DIR", "/srv/uploads"),
            ("CADENCE_SWEEP_INTERVAL_SECS", "15"),
            ("CADENCE_PEAK_HOURS", "12, 7"),
            ("CADENCE_UTC_OFFSET_HOURS", "1"),
            ("CADENCE_HORIZON_DAYS", "14"),
            ("CADENCE_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/cadence"));
        assert_eq!(cfg.auth_token.as_deref(), Some("tok"));
        assert_eq!(cfg.uploads_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(15));
        assert_eq!(cfg.slots.peak_hours, vec![7, 12]);
        assert_eq!(cfg.slots.utc_offset_hours, 1);
        assert_eq!(cfg.slots.horizon_days, 14);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_token_means_auth_disabled() {
        let cfg = AppConfig::from_lookup(lookup(&[("CADENCE_AUTH_TOKEN", "  ")])).unwrap();
        assert!(cfg.auth_token.is_none());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = AppConfig::from_lookup(lookup(&[("CADENCE_PEAK_HOURS", "8,25")])).unwrap_err();
        assert!(matches!(err, ConfigError::Slots(SlotConfigError::InvalidHour(25))));

        let err = AppConfig::from_lookup(lookup(&[("CADENCE_SWEEP_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("CADENCE_SWEEP_INTERVAL_SECS"));

        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = AppConfig {
            auth_token: Some("hunter2".into()),
            database_url: Some("postgres://app:pw0rd@db/cadence".into()),
            ..AppConfig::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("pw0rd"));
    }
}

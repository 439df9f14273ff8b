//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `ROTA_*` environment variables, an optional config file,
//! or command-line overrides, in the precedence `ortho_config` defines.

use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::IdleConfig;
use crate::outbound::supabase::SupabaseConfig;

const DEFAULT_SCHEMA: &str = "coop";
const DEFAULT_IDLE_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_COUNTDOWN_SECONDS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;

/// Connection values that are missing or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("ROTA_SUPABASE_URL is not set")]
    MissingUrl,
    #[error("ROTA_SUPABASE_URL is not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("ROTA_SUPABASE_ANON_KEY is not set")]
    MissingAnonKey,
}

/// Configuration for the rota dashboard.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROTA")]
pub struct RotaSettings {
    /// Base URL of the hosted backend project.
    pub supabase_url: Option<String>,
    /// Public API key sent with every request.
    pub supabase_anon_key: Option<String>,
    /// Database schema holding the `employees` and `shifts` tables.
    pub schema: Option<String>,
    /// Seconds without activity before the logout warning appears.
    pub idle_timeout_seconds: Option<u64>,
    /// Length of the logout countdown.
    pub countdown_seconds: Option<u64>,
    /// Watchdog poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Per-request timeout for backend calls.
    pub request_timeout_seconds: Option<u64>,
    /// Emit JSON log lines instead of human-readable ones.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

impl std::fmt::Debug for RotaSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotaSettings")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &self.supabase_anon_key.as_ref().map(|_| ".."))
            .field("schema", &self.schema)
            .field("idle_timeout_seconds", &self.idle_timeout_seconds)
            .field("countdown_seconds", &self.countdown_seconds)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl RotaSettings {
    pub fn schema(&self) -> &str {
        self.schema
            .as_deref()
            .map(str::trim)
            .filter(|schema| !schema.is_empty())
            .unwrap_or(DEFAULT_SCHEMA)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(
            self.idle_timeout_seconds
                .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECONDS),
        )
    }

    pub fn countdown_seconds(&self) -> u64 {
        self.countdown_seconds.unwrap_or(DEFAULT_COUNTDOWN_SECONDS)
    }

    /// Poll interval, never below one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .max(1),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        )
    }

    /// Watchdog timings.
    pub fn idle_config(&self) -> IdleConfig {
        IdleConfig {
            idle_threshold: self.idle_timeout(),
            countdown_seconds: self.countdown_seconds(),
            poll_interval: self.poll_interval(),
        }
    }

    /// Validate the connection values and build the backend client config.
    pub fn supabase_config(&self) -> Result<SupabaseConfig, SettingsError> {
        let raw_url = non_blank(self.supabase_url.as_deref()).ok_or(SettingsError::MissingUrl)?;
        let url =
            Url::parse(raw_url).map_err(|error| SettingsError::InvalidUrl(error.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }
        let anon_key =
            non_blank(self.supabase_anon_key.as_deref()).ok_or(SettingsError::MissingAnonKey)?;

        Ok(SupabaseConfig {
            url,
            anon_key: Zeroizing::new(anon_key.to_owned()),
            schema: self.schema().to_owned(),
            request_timeout: self.request_timeout(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

//! # Configuration Management Module
//!
//! TOML configuration for the responder, grouped into sections:
//!
//! - [`ModemConfig`] - serial device and read timeout
//! - [`TimingConfig`] - protocol settle delays and loop pacing
//! - [`WeatherConfig`] - meteoblue forecast client
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Every section carries serde defaults, so a file that only sets
//! `modem.port` and `weather.api_key` is complete.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use smsweather::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Modem: {} @ {}", config.modem.port, config.modem.baud_rate);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [modem]
//! port = "/dev/ttyS0"
//! baud_rate = 115200
//! timeout_ms = 1000
//!
//! [timing]
//! per_message_ms = 15000
//!
//! [weather]
//! api_key = "..."
//! ```
//!
//! Precedence: CLI args > Environment (`SMSWEATHER_API_KEY`) > Config file > Defaults

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "SMSWEATHER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub modem: ModemConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub port: String,
    /// 115200 for the HAT on `/dev/ttyS0`; USB dongles are often 9600.
    pub baud_rate: u32,
    /// Per-read timeout. `read_all` returns once a read has been idle this long.
    pub timeout_ms: u64,
    /// Read back the modem output after each send and log whether `+CMGS:` was seen.
    pub verify_send: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".to_string(),
            baud_rate: 115200,
            timeout_ms: 1000,
            verify_send: false,
        }
    }
}

impl ModemConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Delays inserted between protocol steps and loop passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after `AT+CMGS` and after writing the body.
    pub send_settle_ms: u64,
    /// Wait after the SUB terminator for the modem to hand the SMS off.
    pub send_complete_ms: u64,
    /// Wait before polling again when nothing was unread.
    pub idle_poll_ms: u64,
    /// Wait after each reply before deleting and moving on (modem throughput).
    pub per_message_ms: u64,
    /// Wait after a pass that hit an error.
    pub error_cooldown_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            send_settle_ms: 500,
            send_complete_ms: 2000,
            idle_poll_ms: 5000,
            per_message_ms: 15000,
            error_cooldown_ms: 60000,
        }
    }
}

impl TimingConfig {
    /// All delays zero; used by tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            send_settle_ms: 0,
            send_complete_ms: 0,
            idle_poll_ms: 0,
            per_message_ms: 0,
            error_cooldown_ms: 0,
        }
    }

    pub fn send_settle(&self) -> Duration {
        Duration::from_millis(self.send_settle_ms)
    }

    pub fn send_complete(&self) -> Duration {
        Duration::from_millis(self.send_complete_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn per_message(&self) -> Duration {
        Duration::from_millis(self.per_message_ms)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_millis(self.error_cooldown_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Enable/disable forecast lookups. When disabled every lookup fails and
    /// senders receive the failure text.
    pub enabled: bool,
    /// meteoblue API key
    pub api_key: String,
    /// Package endpoint; must return the basic-6h and basic-day blocks.
    pub base_url: String,
    /// Value of the `windspeed` query parameter
    pub windspeed_unit: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// How long a formatted forecast is reused for the same coordinates
    pub cache_ttl_minutes: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            base_url: "https://my.meteoblue.com/packages/basic-6h_basic-day_sunmoon".to_string(),
            windspeed_unit: "kmh".to_string(),
            timeout_seconds: 10,
            cache_ttl_minutes: 30,
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds as u64)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes as u64 * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("smsweather.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parse `level`, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file, then apply environment overrides.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.apply_env_overrides(std::env::var(API_KEY_ENV).ok());

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// A non-empty key from the environment replaces the file's key.
    pub fn apply_env_overrides(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.weather.api_key = key.trim().to_string();
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_modem_pacing() {
        let config = Config::default();
        assert_eq!(config.modem.port, "/dev/ttyS0");
        assert_eq!(config.modem.baud_rate, 115200);
        assert_eq!(config.timing.send_settle(), Duration::from_millis(500));
        assert_eq!(config.timing.send_complete(), Duration::from_secs(2));
        assert_eq!(config.timing.idle_poll(), Duration::from_secs(5));
        assert_eq!(config.timing.per_message(), Duration::from_secs(15));
        assert_eq!(config.timing.error_cooldown(), Duration::from_secs(60));
        assert_eq!(config.weather.windspeed_unit, "kmh");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [modem]
            port = "/dev/ttyUSB2"
            baud_rate = 9600

            [weather]
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.modem.port, "/dev/ttyUSB2");
        assert_eq!(config.modem.baud_rate, 9600);
        assert_eq!(config.modem.timeout_ms, 1000);
        assert_eq!(config.weather.api_key, "abc");
        assert!(config.weather.enabled);
        assert_eq!(config.timing.per_message_ms, 15000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.modem.port, ModemConfig::default().port);
    }

    #[test]
    fn test_env_key_overrides_file() {
        let mut config = Config::default();
        config.weather.api_key = "from-file".to_string();

        config.apply_env_overrides(Some("   ".to_string()));
        assert_eq!(config.weather.api_key, "from-file");

        config.apply_env_overrides(None);
        assert_eq!(config.weather.api_key, "from-file");

        config.apply_env_overrides(Some(" from-env ".to_string()));
        assert_eq!(config.weather.api_key, "from-env");
    }

    #[test]
    fn test_level_filter_fallback() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        logging.level = "debug".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        logging.level = "loud".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_immediate_timing_is_zero() {
        let timing = TimingConfig::immediate();
        assert!(timing.per_message().is_zero());
        assert!(timing.error_cooldown().is_zero());
    }

    #[tokio::test]
    async fn test_create_default_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.modem.port, "/dev/ttyS0");
        assert_eq!(loaded.timing.error_cooldown_ms, 60000);
        assert_eq!(loaded.logging.file.as_deref(), Some("smsweather.log"));
    }
}

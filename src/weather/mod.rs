//! Weather module for turning coordinates into a forecast SMS.
//!
//! Forecasts come from meteoblue's `basic-6h_basic-day_sunmoon` package.
//! Callers only see [`ForecastProvider::format_forecast`], which always
//! yields text: the rendered forecast, or [`FORMAT_FAILURE`].

pub mod format;

use log::{debug, warn};
use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use crate::config::WeatherConfig;
pub use format::{pictogram_description, Forecast};

/// Reply text for any failed lookup.
pub const FORMAT_FAILURE: &str = "Cannot format data";

/// Source of forecast text for a coordinate pair.
///
/// Implementations never fail towards the caller; they return
/// [`FORMAT_FAILURE`] instead.
pub trait ForecastProvider {
    fn format_forecast(&mut self, lat: &str, lon: &str) -> impl Future<Output = String>;
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather lookups are disabled")]
    Disabled,

    #[error("meteoblue API key not configured")]
    MissingApiKey,

    #[cfg(feature = "weather")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("failed to parse forecast JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("forecast has no {field}[{index}]")]
    MissingField { field: &'static str, index: usize },

    #[error("unknown pictocode {0}")]
    UnknownPictocode(u32),

    #[error("weather support not compiled in")]
    Unsupported,
}

/// Most coordinate pairs kept at once; the oldest entry makes room.
pub const MAX_CACHE_ENTRIES: usize = 64;

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    text: String,
}

/// meteoblue client with a small per-coordinate cache.
pub struct MeteoblueService {
    config: WeatherConfig,
    cache: HashMap<(String, String), CacheEntry>,
    #[cfg(feature = "weather")]
    client: reqwest::Client,
}

impl MeteoblueService {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            #[cfg(feature = "weather")]
            client: reqwest::Client::builder()
                .timeout(config.timeout())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
            cache: HashMap::new(),
        }
    }

    /// Check if the service is properly configured
    pub fn is_configured(&self) -> bool {
        self.config.enabled && !self.config.api_key.is_empty()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of forecasts currently held.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Store a rendered forecast, dropping expired entries first. Nothing is
    /// stored when the TTL is zero.
    fn remember(&mut self, key: (String, String), text: &str) {
        let ttl = self.config.cache_ttl();
        self.cache.retain(|_, e| e.fetched_at.elapsed() < ttl);
        if ttl.is_zero() {
            return;
        }
        if self.cache.len() >= MAX_CACHE_ENTRIES && !self.cache.contains_key(&key) {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.cache.remove(&oldest);
            }
        }
        self.cache.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                text: text.to_string(),
            },
        );
    }

    /// Forecast URL for a coordinate pair. Coordinates come from SMS text and
    /// are percent-encoded.
    pub fn build_api_url(&self, lat: &str, lon: &str) -> String {
        format!(
            "{}?lat={}&lon={}&apikey={}&windspeed={}",
            self.config.base_url,
            urlencoding::encode(lat),
            urlencoding::encode(lon),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.windspeed_unit)
        )
    }

    /// Fetch and decode the raw forecast.
    pub async fn fetch_forecast(&self, lat: &str, lon: &str) -> Result<Forecast, WeatherError> {
        if !self.config.enabled {
            return Err(WeatherError::Disabled);
        }
        if self.config.api_key.is_empty() {
            return Err(WeatherError::MissingApiKey);
        }

        #[cfg(feature = "weather")]
        {
            let url = self.build_api_url(lat, lon);
            debug!("Fetching forecast for {},{}", lat, lon);

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(WeatherError::Status(response.status().as_u16()));
            }
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }

        #[cfg(not(feature = "weather"))]
        {
            let _ = (lat, lon);
            Err(WeatherError::Unsupported)
        }
    }

    /// Rendered forecast text, served from cache while fresh.
    pub async fn forecast_text(&mut self, lat: &str, lon: &str) -> Result<String, WeatherError> {
        let key = (lat.to_string(), lon.to_string());
        if let Some(entry) = self.cache.get(&key) {
            let age = entry.fetched_at.elapsed();
            if age < self.config.cache_ttl() {
                debug!(
                    "Returning cached forecast for {},{} (age: {:.1}min)",
                    lat,
                    lon,
                    age.as_secs_f64() / 60.0
                );
                return Ok(entry.text.clone());
            }
        }

        let forecast = self.fetch_forecast(lat, lon).await?;
        let text = format::render(&forecast)?;
        self.remember(key, &text);
        Ok(text)
    }
}

impl ForecastProvider for MeteoblueService {
    async fn format_forecast(&mut self, lat: &str, lon: &str) -> String {
        match self.forecast_text(lat, lon).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Forecast for {},{} failed: {}", lat, lon, e);
                FORMAT_FAILURE.to_string()
            }
        }
    }
}

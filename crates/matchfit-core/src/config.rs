//! ============================================================================
//! Application Configuration
//! ============================================================================
//! Service credentials, endpoints and model names, read from environment
//! variables. A credential that is missing, empty or still the
//! `YOUR_API_KEY` placeholder counts as not configured.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::retry::RetryConfig;
use crate::types::MatchFitError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_PIXABAY_BASE_URL: &str = "https://pixabay.com/api/";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Placeholder shipped in sample configs
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

/// Which upstream produces weather reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    /// OpenWeather current observation (`/weather`)
    #[default]
    Current,
    /// OpenWeather 5-day / 3-hour forecast list (`/forecast`)
    Forecast,
    /// Generative completion service asked for a weather JSON object
    Generative,
}

impl FromStr for WeatherSource {
    type Err = MatchFitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" | "observation" => Ok(WeatherSource::Current),
            "forecast" => Ok(WeatherSource::Forecast),
            "generative" | "gemini" | "ai" => Ok(WeatherSource::Generative),
            other => Err(MatchFitError::Validation(format!(
                "Unknown weather source '{}'. Valid values: current, forecast, generative",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub pixabay_api_key: Option<String>,
    pub weather_source: WeatherSource,
    pub text_model: String,
    pub image_model: String,
    pub gemini_base_url: String,
    pub openweather_base_url: String,
    pub pixabay_base_url: String,
    pub max_attempts: u32,
    /// Base backoff delay; attempts wait base * 2^attempt
    pub retry_base_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openweather_api_key: None,
            pixabay_api_key: None,
            weather_source: WeatherSource::default(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            pixabay_base_url: DEFAULT_PIXABAY_BASE_URL.to_string(),
            max_attempts: RetryConfig::default().max_attempts,
            retry_base_delay_ms: RetryConfig::default().base_delay_ms,
        }
    }
}

impl AppConfig {
    /// Build config from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from any variable lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let weather_source = match lookup("MATCHFIT_WEATHER_SOURCE") {
            Some(raw) => raw.parse().unwrap_or_else(|e: MatchFitError| {
                warn!("{} - using {:?}", e, defaults.weather_source);
                defaults.weather_source
            }),
            None => defaults.weather_source,
        };

        let max_attempts = match lookup("MATCHFIT_MAX_ATTEMPTS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid MATCHFIT_MAX_ATTEMPTS '{}' - using {}", raw, defaults.max_attempts);
                defaults.max_attempts
            }),
            None => defaults.max_attempts,
        };

        Self {
            gemini_api_key: credential(lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY"))),
            openweather_api_key: credential(lookup("OPENWEATHER_API_KEY")),
            pixabay_api_key: credential(lookup("PIXABAY_API_KEY")),
            weather_source,
            text_model: lookup("MATCHFIT_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: lookup("MATCHFIT_IMAGE_MODEL").unwrap_or(defaults.image_model),
            gemini_base_url: lookup("MATCHFIT_GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            openweather_base_url: lookup("MATCHFIT_OPENWEATHER_BASE_URL")
                .unwrap_or(defaults.openweather_base_url),
            pixabay_base_url: lookup("MATCHFIT_PIXABAY_BASE_URL").unwrap_or(defaults.pixabay_base_url),
            max_attempts,
            retry_base_delay_ms: defaults.retry_base_delay_ms,
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay_ms: self.retry_base_delay_ms,
        }
    }

    /// Credential the configured weather source needs, if present
    pub fn weather_credential(&self) -> Option<&str> {
        match self.weather_source {
            WeatherSource::Current | WeatherSource::Forecast => self.openweather_api_key.as_deref(),
            WeatherSource::Generative => self.gemini_api_key.as_deref(),
        }
    }
}

/// Normalize a credential: blank and placeholder values become `None`
fn credential(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY)
}

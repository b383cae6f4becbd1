//! ============================================================================
//! Weather Module - Location Lookup and Report Normalization
//! ============================================================================
//! Fetches weather for a free-text location from the configured source and
//! normalizes it into a `WeatherReport`.
//!
//! ## Sources
//! - **Current**: OpenWeather current observation
//! - **Forecast**: OpenWeather 3-hour forecast, nearest bucket to now
//! - **Generative**: Gemini asked for a weather JSON object
//! - **Mock**: deterministic keyword table when the source has no credential
//!
//! ## Usage
//! ```rust,ignore
//! use matchfit_core::{AppConfig, WeatherClient};
//!
//! let weather = WeatherClient::from_config(&AppConfig::from_env());
//! let report = weather.fetch("London").await?;
//! ```
//! ============================================================================

mod mock;
mod openweather;

pub use mock::mock_report;
pub use openweather::{
    nearest_bucket, normalize_current, normalize_forecast, CurrentObservation, ForecastEntry,
    ForecastList, ProviderResponse,
};

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, WeatherSource, DEFAULT_OPENWEATHER_BASE_URL};
use crate::executor::{GeminiClient, GenerationConfig, Part};
use crate::http::get_json;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{MatchFitError, WeatherReport};

const LOOKUP_FAILURE: &str = "Failed to get weather for that location. Please try again.";

/// Where reports come from once credentials are resolved
#[derive(Clone)]
enum Backend {
    OpenWeather {
        api_key: String,
        forecast: bool,
    },
    Generative(GeminiClient),
    Mock,
}

/// Weather lookup client
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    backend: Backend,
    base_url: String,
    retry: RetryConfig,
}

impl WeatherClient {
    /// Build from config, falling back to mock data when the selected source
    /// has no credential
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = match (config.weather_source, config.weather_credential()) {
            (_, None) => Backend::Mock,
            (WeatherSource::Generative, Some(_)) => GeminiClient::from_config(config)
                .map(Backend::Generative)
                .unwrap_or(Backend::Mock),
            (source, Some(key)) => Backend::OpenWeather {
                api_key: key.to_string(),
                forecast: source == WeatherSource::Forecast,
            },
        };

        if matches!(backend, Backend::Mock) {
            warn!(
                "No credential for weather source {:?} - using mock weather data",
                config.weather_source
            );
        }

        Self {
            client: reqwest::Client::new(),
            backend,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            retry: config.retry(),
        }
    }

    /// Client that always answers with mock data
    pub fn mock() -> Self {
        Self {
            client: reqwest::Client::new(),
            backend: Backend::Mock,
            base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.backend, Backend::Mock)
    }

    /// Look up weather for a free-text location.
    ///
    /// Blank input is rejected before any request. Every provider failure,
    /// including an unknown city, is reported as the same lookup error.
    pub async fn fetch(&self, location: &str) -> Result<WeatherReport, MatchFitError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(MatchFitError::Validation("Please enter a location.".to_string()));
        }

        info!("Fetching weather for '{}'", location);

        let response = match &self.backend {
            Backend::Mock => {
                debug!("Using mock weather for '{}'", location);
                return Ok(mock_report(location));
            }
            Backend::OpenWeather { api_key, forecast } => {
                self.fetch_openweather(location, api_key, *forecast).await
            }
            Backend::Generative(gemini) => fetch_generative(gemini, location).await,
        };

        let report = response
            .and_then(|r| r.into_report(Utc::now()))
            .map_err(|e| {
                warn!("Weather lookup for '{}' failed: {}", location, e);
                MatchFitError::Provider(LOOKUP_FAILURE.to_string())
            })?;

        info!("Weather for {}: {}°C, {}", report.location, report.temperature, report.condition);
        Ok(report)
    }

    async fn fetch_openweather(&self, location: &str, api_key: &str, forecast: bool) -> Result<ProviderResponse> {
        let endpoint = if forecast { "forecast" } else { "weather" };
        let url = format!("{}/{}", self.base_url, endpoint);
        let client = &self.client;
        let url = url.as_str();
        let params = [("q", location), ("units", "metric"), ("appid", api_key)];
        let params = &params[..];

        if forecast {
            let list: ForecastList = with_retry(&self.retry, "OpenWeather forecast", || {
                get_json(client, "OpenWeather", url, params)
            })
            .await?;
            Ok(ProviderResponse::Forecast(list))
        } else {
            let observation: CurrentObservation = with_retry(&self.retry, "OpenWeather weather", || {
                get_json(client, "OpenWeather", url, params)
            })
            .await?;
            Ok(ProviderResponse::Current(observation))
        }
    }
}

/// Ask the completion service for a report in the normalized shape
async fn fetch_generative(gemini: &GeminiClient, location: &str) -> Result<ProviderResponse> {
    let prompt = format!(
        "Based on the following location, generate a concise weather report for the current day.\n\
        Location: {}\n\
        Your response must be a valid JSON object that adheres to the provided schema. \
        Do not include any text, markdown, or backticks outside of the JSON object.\n\
        Provide the location as \"City, Country\". Wind speed should be in km/h. Temperature in Celsius.",
        location
    );

    let text = gemini
        .generate_content(vec![Part::text(prompt)], Some(GenerationConfig::json(weather_schema())))
        .await?;

    let report: WeatherReport = serde_json::from_str(text.trim())
        .map_err(|e| anyhow!("Weather response did not match schema: {}", e))?;

    Ok(ProviderResponse::Generative(report))
}

/// Response schema for the generative weather source
pub fn weather_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "location": {"type": "STRING"},
            "temperature": {"type": "NUMBER"},
            "condition": {"type": "STRING", "description": "e.g., 'Partly Cloudy', 'Sunny', 'Light Rain'"},
            "feelsLike": {"type": "NUMBER"},
            "humidity": {"type": "NUMBER", "description": "As a percentage, e.g., 65"},
            "windSpeed": {"type": "NUMBER", "description": "In km/h"},
            "rain": {"type": "NUMBER", "description": "Chance of rain as a percentage"},
            "summary": {"type": "STRING", "description": "A brief, one-sentence summary of the day's weather."}
        },
        "required": ["location", "temperature", "condition", "feelsLike", "humidity", "windSpeed", "summary"]
    })
}

//! Typed parsers for each weather upstream, normalized into `WeatherReport`.
//!
//! Every source has its own response type; the source is chosen by
//! configuration, never by inspecting the shape of a response.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::WeatherReport;

/// OpenWeather reports wind in m/s with metric units
const MS_TO_KMH: f64 = 3.6;

// ============================================================================
// OpenWeather Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
}

/// `/data/2.5/weather` response
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentObservation {
    pub name: String,
    #[serde(default)]
    pub sys: Sys,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    /// Present only while rain is being observed
    #[serde(default)]
    pub rain: Option<serde_json::Value>,
}

/// One 3-hour bucket of `/data/2.5/forecast`
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Unix seconds
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// `/data/2.5/forecast` response
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastList {
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

// ============================================================================
// Normalization
// ============================================================================

/// Response from the configured upstream, one variant per schema
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Current(CurrentObservation),
    Forecast(ForecastList),
    /// The generative source answers directly in the normalized shape
    Generative(WeatherReport),
}

impl ProviderResponse {
    /// Map into the canonical report; `now` picks the forecast bucket
    pub fn into_report(self, now: DateTime<Utc>) -> Result<WeatherReport> {
        match self {
            ProviderResponse::Current(observation) => normalize_current(observation),
            ProviderResponse::Forecast(forecast) => normalize_forecast(forecast, now),
            ProviderResponse::Generative(report) => Ok(report),
        }
    }
}

fn location_label(name: &str, country: Option<&str>) -> String {
    match country.filter(|c| !c.is_empty()) {
        Some(country) => format!("{}, {}", name, country),
        None => name.to_string(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One-sentence human summary
pub fn summarize(description: &str, temperature: f64, feels_like: f64, rain: f64) -> String {
    let mut summary = format!(
        "{} at {:.0}°C, feeling like {:.0}°C",
        capitalize(description),
        temperature,
        feels_like
    );
    if rain >= 50.0 {
        summary.push_str(", rain is likely");
    }
    summary.push('.');
    summary
}

fn build_report(
    location: String,
    main: &MainReadings,
    condition: &Condition,
    wind: &Wind,
    rain: f64,
) -> WeatherReport {
    let description = if condition.description.is_empty() {
        condition.main.as_str()
    } else {
        condition.description.as_str()
    };

    WeatherReport {
        location,
        temperature: main.temp,
        feels_like: main.feels_like,
        humidity: main.humidity,
        wind_speed: round1(wind.speed * MS_TO_KMH),
        rain,
        condition: condition.main.clone(),
        summary: summarize(description, main.temp, main.feels_like, rain),
    }
}

/// Current observation: rain chance is 100 while rain is observed, else 0
pub fn normalize_current(observation: CurrentObservation) -> Result<WeatherReport> {
    let condition = observation
        .weather
        .first()
        .ok_or_else(|| anyhow!("Observation has no weather condition"))?;
    let rain = if observation.rain.is_some() { 100.0 } else { 0.0 };

    Ok(build_report(
        location_label(&observation.name, observation.sys.country.as_deref()),
        &observation.main,
        condition,
        &observation.wind,
        rain,
    ))
}

/// Forecast list: the bucket whose timestamp is nearest to `now`
pub fn normalize_forecast(forecast: ForecastList, now: DateTime<Utc>) -> Result<WeatherReport> {
    let entry = nearest_bucket(&forecast.list, now)
        .ok_or_else(|| anyhow!("Forecast list is empty"))?;
    let condition = entry
        .weather
        .first()
        .ok_or_else(|| anyhow!("Forecast bucket has no weather condition"))?;

    Ok(build_report(
        location_label(&forecast.city.name, forecast.city.country.as_deref()),
        &entry.main,
        condition,
        &entry.wind,
        (entry.pop.clamp(0.0, 1.0) * 100.0).round(),
    ))
}

/// Entry closest in time to `now`; ties go to the earlier bucket
pub fn nearest_bucket(list: &[ForecastEntry], now: DateTime<Utc>) -> Option<&ForecastEntry> {
    let now = now.timestamp();
    list.iter().min_by_key(|entry| entry.dt.abs_diff(now))
}

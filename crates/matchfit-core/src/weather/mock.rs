//! Deterministic weather used when no provider credential is configured.

use crate::types::WeatherReport;

use super::openweather::summarize;

/// Keyword → temperature table, first match wins
const MOCK_CITIES: [(&str, f64); 3] = [("london", 12.0), ("new york", 18.0), ("tokyo", 25.0)];

const DEFAULT_MOCK_TEMPERATURE: f64 = 20.0;

/// Below this the mock sky is cloudy
const CLOUDY_BELOW: f64 = 15.0;

/// Mock report for a location; the same input always yields the same report
pub fn mock_report(location: &str) -> WeatherReport {
    let location = location.trim();
    let lower = location.to_lowercase();

    let temperature = MOCK_CITIES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, temp)| *temp)
        .unwrap_or(DEFAULT_MOCK_TEMPERATURE);

    let cloudy = temperature < CLOUDY_BELOW;
    let condition = if cloudy { "Clouds" } else { "Clear" };
    let feels_like = temperature - 1.0;
    let rain = if cloudy { 30.0 } else { 5.0 };

    WeatherReport {
        location: location.to_string(),
        temperature,
        feels_like,
        humidity: if cloudy { 70.0 } else { 45.0 },
        wind_speed: 12.0,
        rain,
        condition: condition.to_string(),
        summary: summarize(if cloudy { "cloudy" } else { "clear skies" }, temperature, feels_like, rain),
    }
}

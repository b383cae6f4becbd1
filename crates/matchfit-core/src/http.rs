//! Shared JSON request helpers used by every provider client.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error envelope used by Google and OpenWeather style APIs
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response body into an error with the provider's message
fn status_error(service: &str, status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(message) = parsed.error.map(|e| e.message).or(parsed.message) {
            return anyhow!("{} API error ({}): {}", service, status, message);
        }
    }
    anyhow!("{} API error ({}): {}", service, status, body)
}

async fn read_json<R: DeserializeOwned>(service: &str, response: reqwest::Response) -> Result<R> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read {} response body: {}", service, e))?;

    if !status.is_success() {
        return Err(status_error(service, status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| anyhow!("Failed to parse {} response: {} - body: {}", service, e, body))
}

/// POST a JSON body and decode a JSON response
pub async fn post_json<B, R>(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    debug!("POST {} ({})", service, url);

    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to call {} API: {}", service, e))?;

    read_json(service, response).await
}

/// GET with query parameters and decode a JSON response
pub async fn get_json<R: DeserializeOwned>(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<R> {
    debug!("GET {} ({})", service, url);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to call {} API: {}", service, e))?;

    read_json(service, response).await
}

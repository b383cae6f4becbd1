//! ============================================================================
//! Image Search Executor - Weather-Matched Looks via Pixabay
//! ============================================================================
//! Turns the current weather into a clothing keyword, combines it with the
//! preferred style and searches fashion photos for matching looks.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{AppConfig, DEFAULT_PIXABAY_BASE_URL};
use crate::http::get_json;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{MatchFitError, WeatherReport};

const RESULTS_PER_PAGE: &str = "10";

/// One photo returned by the search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageHit {
    pub id: u64,
    #[serde(default)]
    pub tags: String,
    #[serde(rename = "largeImageURL")]
    pub large_image_url: String,
}

/// Display record for a matched look
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductMatch {
    pub id: u64,
    /// First tag of the hit, or the query when it has none
    pub name: String,
    pub image_url: String,
    pub tags: String,
}

impl ProductMatch {
    pub fn from_hit(hit: ImageHit, query: &str) -> Self {
        let name = hit
            .tags
            .split(',')
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(query)
            .to_string();

        Self {
            id: hit.id,
            name,
            image_url: hit.large_image_url,
            tags: hit.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<ImageHit>,
}

/// Clothing keyword suited to the temperature and condition
pub fn outfit_keyword(temperature: f64, condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("rain") || condition.contains("drizzle") {
        "raincoat and waterproof"
    } else if temperature < 10.0 {
        "warm coat or sweater outfit"
    } else if temperature >= 20.0 {
        "light summer dress or t-shirt outfit"
    } else {
        "light jacket or long sleeve shirt outfit"
    }
}

/// Search query for a style and weather report
pub fn build_query(style: &str, weather: &WeatherReport) -> String {
    format!(
        "{} {}",
        style.trim().to_lowercase(),
        outfit_keyword(weather.temperature, &weather.condition)
    )
}

/// Executor for fashion image search
pub struct ImageSearchExecutor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl ImageSearchExecutor {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_PIXABAY_BASE_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Create from app config; a missing key is a validation failure
    pub fn from_config(config: &AppConfig) -> Result<Self, MatchFitError> {
        let api_key = config.pixabay_api_key.clone().ok_or_else(|| {
            MatchFitError::Validation("PIXABAY_API_KEY is not configured.".to_string())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.pixabay_base_url.clone(),
            retry: config.retry(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Find looks for the weather and style
    pub async fn search_for_weather(
        &self,
        style: &str,
        weather: &WeatherReport,
    ) -> Result<Vec<ProductMatch>, MatchFitError> {
        self.search(&build_query(style, weather)).await
    }

    /// Search fashion photos for a free-text query
    pub async fn search(&self, query: &str) -> Result<Vec<ProductMatch>, MatchFitError> {
        info!("Searching looks for: {}", query);

        let client = &self.client;
        let url = self.base_url.as_str();
        let params = [
            ("key", self.api_key.as_str()),
            ("q", query),
            ("image_type", "photo"),
            ("category", "fashion"),
            ("per_page", RESULTS_PER_PAGE),
        ];
        let params = &params[..];

        let response: SearchResponse = with_retry(&self.retry, "Pixabay search", || {
            get_json(client, "Pixabay", url, params)
        })
        .await
        .map_err(|e| {
            warn!("Image search failed: {}", e);
            MatchFitError::Provider("Failed to fetch clothing recommendations.".to_string())
        })?;

        if response.hits.is_empty() {
            return Err(MatchFitError::EmptyResult(format!(
                "No fashion results found for: \"{}\". Try a different style or location.",
                query
            )));
        }

        let matches: Vec<ProductMatch> = response
            .hits
            .into_iter()
            .map(|hit| ProductMatch::from_hit(hit, query))
            .collect();

        info!("Found {} looks", matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeProvider, Route};
    use serde_json::json;

    fn weather(temperature: f64, condition: &str) -> WeatherReport {
        WeatherReport {
            location: "Paris, FR".into(),
            temperature,
            feels_like: temperature,
            humidity: 50.0,
            wind_speed: 10.0,
            rain: 0.0,
            condition: condition.into(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_outfit_keyword_thresholds() {
        assert_eq!(outfit_keyword(25.0, "Light Rain"), "raincoat and waterproof");
        assert_eq!(outfit_keyword(5.0, "Drizzle"), "raincoat and waterproof");
        assert_eq!(outfit_keyword(9.9, "Clear"), "warm coat or sweater outfit");
        assert_eq!(outfit_keyword(10.0, "Clouds"), "light jacket or long sleeve shirt outfit");
        assert_eq!(outfit_keyword(19.9, "Clouds"), "light jacket or long sleeve shirt outfit");
        assert_eq!(outfit_keyword(20.0, "Clear"), "light summer dress or t-shirt outfit");
    }

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("Casual", &weather(12.0, "Clouds")),
            "casual light jacket or long sleeve shirt outfit"
        );
    }

    #[test]
    fn test_product_name_from_first_tag() {
        let hit = ImageHit {
            id: 7,
            tags: " raincoat, fashion, woman".into(),
            large_image_url: "https://example.com/7.jpg".into(),
        };
        let product = ProductMatch::from_hit(hit, "query");
        assert_eq!(product.name, "raincoat");
        assert_eq!(product.image_url, "https://example.com/7.jpg");

        let untagged = ImageHit {
            id: 8,
            tags: String::new(),
            large_image_url: "u".into(),
        };
        assert_eq!(ProductMatch::from_hit(untagged, "casual coat").name, "casual coat");
    }

    #[test]
    fn test_hit_wire_names() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"total":1,"hits":[{"id":1,"tags":"coat","largeImageURL":"https://x/1.jpg","likes":3}]}"#,
        )
        .unwrap();
        assert_eq!(response.hits[0].large_image_url, "https://x/1.jpg");
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = ImageSearchExecutor::from_config(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, MatchFitError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_over_http() {
        let provider = FakeProvider::start(vec![Route::ok(
            "/api/",
            json!({"total": 2, "totalHits": 2, "hits": [
                {"id": 11, "tags": "coat, winter, fashion", "largeImageURL": "https://img.example/11.jpg"},
                {"id": 12, "tags": "", "largeImageURL": "https://img.example/12.jpg"}
            ]}),
        )]);

        let search = ImageSearchExecutor::new("px-key".into())
            .with_base_url(format!("{}/api/", provider.base_url))
            .with_retry_config(RetryConfig::no_retry());
        let looks = search.search_for_weather("Formal", &weather(5.0, "Clouds")).await.unwrap();

        assert_eq!(looks.len(), 2);
        assert_eq!(looks[0].name, "coat");
        assert_eq!(looks[1].name, "formal warm coat or sweater outfit");

        let url = &provider.requests()[0].url;
        assert!(url.contains("key=px-key"));
        assert!(url.contains("image_type=photo"));
        assert!(url.contains("category=fashion"));
        assert!(url.contains("per_page=10"));
    }

    #[tokio::test]
    async fn test_search_without_hits() {
        let provider = FakeProvider::start(vec![Route::ok("/api/", json!({"hits": []}))]);

        let search = ImageSearchExecutor::new("px-key".into())
            .with_base_url(format!("{}/api/", provider.base_url))
            .with_retry_config(RetryConfig::no_retry());
        let err = search.search("Casual light outfit").await.unwrap_err();
        assert!(matches!(err, MatchFitError::EmptyResult(_)));
        assert!(err.message().contains("Casual light outfit"));
    }
}

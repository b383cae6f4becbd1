//! Service seam used by the session controller.
//!
//! `LiveBackend` wires the real weather client and Gemini executors. Tests
//! substitute their own implementation.

use async_trait::async_trait;
use tracing::warn;

use crate::config::AppConfig;
use crate::executor::{AvatarExecutor, GeminiClient, RecommendationExecutor, VisualizationExecutor};
use crate::types::{MatchFitError, OccasionContext, OutfitRecommendation, UserProfile, WeatherReport};
use crate::weather::WeatherClient;

const MISSING_GEMINI_KEY: &str = "GEMINI_API_KEY is not configured.";

/// Every external capability a session needs
#[async_trait]
pub trait StylistBackend: Send + Sync {
    /// Weather for a free-text location
    async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, MatchFitError>;

    /// Outfit suggestions for a profile and context
    async fn recommend(
        &self,
        profile: &UserProfile,
        context: &OccasionContext,
    ) -> Result<Vec<OutfitRecommendation>, MatchFitError>;

    /// Text description of the person in a data-URL photo
    async fn describe_avatar(&self, data_url: &str) -> Result<String, MatchFitError>;

    /// Photo of the outfit as a data URL
    async fn visualize(
        &self,
        outfit: &OutfitRecommendation,
        profile: &UserProfile,
    ) -> Result<String, MatchFitError>;
}

struct GenerativeExecutors {
    recommend: RecommendationExecutor,
    avatar: AvatarExecutor,
    visualize: VisualizationExecutor,
}

/// Backend talking to the configured providers
pub struct LiveBackend {
    weather: WeatherClient,
    generative: Option<GenerativeExecutors>,
}

impl LiveBackend {
    pub fn from_config(config: &AppConfig) -> Self {
        let generative = GeminiClient::from_config(config).map(|gemini| GenerativeExecutors {
            recommend: RecommendationExecutor::new(gemini.clone()),
            avatar: AvatarExecutor::new(gemini.clone()),
            visualize: VisualizationExecutor::new(gemini),
        });

        if generative.is_none() {
            warn!("GEMINI_API_KEY not set - recommendations and images are unavailable");
        }

        Self {
            weather: WeatherClient::from_config(config),
            generative,
        }
    }

    pub fn has_generative(&self) -> bool {
        self.generative.is_some()
    }

    fn generative(&self) -> Result<&GenerativeExecutors, MatchFitError> {
        self.generative
            .as_ref()
            .ok_or_else(|| MatchFitError::Validation(MISSING_GEMINI_KEY.to_string()))
    }
}

#[async_trait]
impl StylistBackend for LiveBackend {
    async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, MatchFitError> {
        self.weather.fetch(location).await
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        context: &OccasionContext,
    ) -> Result<Vec<OutfitRecommendation>, MatchFitError> {
        self.generative()?.recommend.recommend(profile, context).await
    }

    async fn describe_avatar(&self, data_url: &str) -> Result<String, MatchFitError> {
        self.generative()?.avatar.describe(data_url).await
    }

    async fn visualize(
        &self,
        outfit: &OutfitRecommendation,
        profile: &UserProfile,
    ) -> Result<String, MatchFitError> {
        self.generative()?.visualize.visualize(outfit, profile).await
    }
}

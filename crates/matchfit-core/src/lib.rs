//! ============================================================================
//! MATCHFIT-CORE: Styling Session Orchestration
//! ============================================================================
//! This crate handles all backend logic for MatchFit:
//! - Weather lookup and normalization (OpenWeather, Gemini, or mock data)
//! - Outfit recommendations, avatar analysis, and outfit photos via Gemini
//! - Weather-matched looks via Pixabay image search
//! - Session state machine with generation-tagged async results
//! ============================================================================

pub mod config;
pub mod executor;
pub mod http;
pub mod retry;
pub mod session;
pub mod types;
pub mod weather;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use config::{AppConfig, WeatherSource};
pub use executor::{
    AvatarExecutor, GeminiClient, ImageSearchExecutor, RecommendationExecutor,
    VisualizationExecutor,
};
pub use retry::RetryConfig;
pub use session::{
    LiveBackend, SessionController, SessionError, SessionEvent, SessionState, StylistBackend,
    TransitionError,
};
pub use types::*;
pub use weather::WeatherClient;

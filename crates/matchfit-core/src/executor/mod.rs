//! ============================================================================
//! Executor Module - Provider Executors for MatchFit
//! ============================================================================
//! Contains the clients for each generative or search capability:
//! - GeminiClient: shared transport for generateContent / Imagen predict
//! - RecommendationExecutor: outfit suggestions as schema-constrained JSON
//! - AvatarExecutor: person description from an uploaded photo
//! - VisualizationExecutor: outfit photo generation
//! - ImageSearchExecutor: weather-matched looks via Pixabay
//! ============================================================================

mod avatar;
mod gemini;
mod image_search;
mod recommend;
mod visualize;

pub use avatar::{AvatarExecutor, DESCRIBE_INSTRUCTION};
pub use gemini::{GeminiClient, GenerationConfig, ImageOptions, InlineData, Part};
pub use image_search::{build_query, outfit_keyword, ImageHit, ImageSearchExecutor, ProductMatch};
pub use recommend::{
    build_prompt as build_recommendation_prompt, outfit_schema, parse_recommendations,
    RecommendationExecutor, OUTFITS_PER_REQUEST,
};
pub use visualize::{
    build_prompt as build_visualization_prompt, person_description, VisualizationExecutor,
};

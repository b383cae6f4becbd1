//! ============================================================================
//! Recommendation Executor - Outfit Suggestions via Gemini
//! ============================================================================
//! Sends the profile and occasion context as a stylist prompt and asks for a
//! JSON array of outfits constrained by a response schema.
//! ============================================================================

use serde_json::json;
use tracing::{info, warn};

use super::gemini::{GeminiClient, GenerationConfig, Part};
use crate::types::{MatchFitError, OccasionContext, OutfitRecommendation, UserProfile};

/// Number of outfits requested per batch
pub const OUTFITS_PER_REQUEST: usize = 3;

/// Sampling temperature for outfit generation
const RECOMMENDATION_TEMPERATURE: f32 = 0.8;

const PARSE_FAILURE: &str = "Failed to parse recommendations from the AI. Please try again.";

/// Executor for outfit recommendations
pub struct RecommendationExecutor {
    gemini: GeminiClient,
}

impl RecommendationExecutor {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Request outfits for a profile and context.
    ///
    /// Returns the parsed array unmodified; its length is whatever the service
    /// produced.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
        context: &OccasionContext,
    ) -> Result<Vec<OutfitRecommendation>, MatchFitError> {
        info!(
            "Requesting {} outfits for occasion '{}'",
            OUTFITS_PER_REQUEST, context.occasion
        );

        let prompt = build_prompt(profile, context);
        let config = GenerationConfig {
            temperature: Some(RECOMMENDATION_TEMPERATURE),
            ..GenerationConfig::json(outfit_schema())
        };

        let text = self
            .gemini
            .generate_content(vec![Part::text(prompt)], Some(config))
            .await
            .map_err(|e| {
                warn!("Recommendation request failed: {}", e);
                MatchFitError::Provider(PARSE_FAILURE.to_string())
            })?;

        let outfits = parse_recommendations(&text)?;
        info!("Received {} outfit recommendations", outfits.len());
        Ok(outfits)
    }
}

/// Stylist prompt embedding every profile and context field
pub fn build_prompt(profile: &UserProfile, context: &OccasionContext) -> String {
    format!(
        "Act as an expert fashion stylist. Based on the provided user profile and context, \
        generate {count} distinct outfit recommendations.\n\n\
        User Profile:\n\
        - Body Type: {body}\n\
        - Preferred Style: {style}\n\
        - Favorite Colors: {colors}\n\
        - Preferred Fit: {fit}\n\n\
        Context:\n\
        - Occasion: {occasion}\n\
        - Weather: {weather}\n\n\
        Your response must be a valid JSON object that adheres to the provided schema. \
        The JSON object should be an array of outfit recommendations. \
        Do not include any text, markdown, or backticks outside of the JSON object.",
        count = number_word(OUTFITS_PER_REQUEST),
        body = profile.body_type,
        style = profile.style,
        colors = profile.colors.join(", "),
        fit = profile.fit,
        occasion = context.occasion,
        weather = context.weather,
    )
}

fn number_word(n: usize) -> String {
    match n {
        1 => "one".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        4 => "four".to_string(),
        5 => "five".to_string(),
        other => other.to_string(),
    }
}

/// Response schema: array of {outfitName, description, items[{name, description}]}
pub fn outfit_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "outfitName": {
                    "type": "STRING",
                    "description": "A catchy name for the outfit, e.g., 'Urban Explorer' or 'Chic Minimalist'."
                },
                "description": {
                    "type": "STRING",
                    "description": "A brief, compelling description of the outfit's style and vibe."
                },
                "items": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": {
                                "type": "STRING",
                                "description": "The name of the clothing item, e.g., 'Slim-fit Chinos'."
                            },
                            "description": {
                                "type": "STRING",
                                "description": "A detailed description of the item, including color, material, and style notes."
                            }
                        },
                        "required": ["name", "description"]
                    }
                }
            },
            "required": ["outfitName", "description", "items"]
        }
    })
}

/// Parse the service text as an outfit array
pub fn parse_recommendations(text: &str) -> Result<Vec<OutfitRecommendation>, MatchFitError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        warn!("Recommendation response did not match schema: {}", e);
        MatchFitError::Schema(PARSE_FAILURE.to_string())
    })
}

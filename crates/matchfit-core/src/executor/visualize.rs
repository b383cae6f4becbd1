//! ============================================================================
//! Visualization Executor - Outfit Photos via Imagen
//! ============================================================================
//! Renders one recommendation as a full-body fashion photo. The person is
//! described from the avatar analysis when available, else from body type.
//! ============================================================================

use tracing::{info, warn};

use super::gemini::{GeminiClient, ImageOptions};
use crate::types::{MatchFitError, OutfitRecommendation, UserProfile};

const IMAGE_FAILURE: &str = "The AI failed to create an image for this outfit.";

/// Executor for outfit visualization
pub struct VisualizationExecutor {
    gemini: GeminiClient,
    options: ImageOptions,
}

impl VisualizationExecutor {
    pub fn new(gemini: GeminiClient) -> Self {
        Self {
            gemini,
            options: ImageOptions::default(),
        }
    }

    /// Generate one photo; returns a `data:image/jpeg;base64,...` URL
    pub async fn visualize(
        &self,
        outfit: &OutfitRecommendation,
        profile: &UserProfile,
    ) -> Result<String, MatchFitError> {
        info!("Visualizing outfit '{}'", outfit.outfit_name);

        let prompt = build_prompt(outfit, profile);
        let images = self
            .gemini
            .generate_images(&prompt, &self.options)
            .await
            .map_err(|e| {
                warn!("Image generation request failed: {}", e);
                MatchFitError::Provider(IMAGE_FAILURE.to_string())
            })?;

        let image = images.into_iter().next().ok_or_else(|| {
            warn!("No image was generated for '{}'", outfit.outfit_name);
            MatchFitError::EmptyResult(IMAGE_FAILURE.to_string())
        })?;

        Ok(image.to_data_url())
    }
}

/// Person phrase: avatar description when known, else the body type
pub fn person_description(profile: &UserProfile) -> String {
    match profile.avatar_description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => {
            format!("a person who looks like this: {}", description)
        }
        _ => format!("a person with a '{}' body type", profile.body_type),
    }
}

/// Photo prompt for an outfit
pub fn build_prompt(outfit: &OutfitRecommendation, profile: &UserProfile) -> String {
    let detailed_items = outfit
        .items
        .iter()
        .map(|item| format!("{} ({})", item.name, item.description))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Generate a photorealistic, full-body fashion photograph of {}.\n\
        They are wearing a stylish outfit consisting of: {}.\n\
        The background should be a minimal and clean urban environment that complements the outfit.\n\
        The lighting must be bright and natural, mimicking a high-end fashion photoshoot.\n\
        The person should have a confident and relaxed pose, showcasing the outfit clearly.\n\
        The image should be high-resolution and visually appealing.",
        person_description(profile),
        detailed_items
    )
}

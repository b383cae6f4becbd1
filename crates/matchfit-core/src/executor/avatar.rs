//! ============================================================================
//! Avatar Executor - Person Description via Gemini Vision
//! ============================================================================
//! Describes the person in an uploaded photo so later image generations can
//! depict someone who looks like the user.
//! ============================================================================

use tracing::{info, warn};

use super::gemini::{GeminiClient, Part};
use crate::types::{InlineImage, MatchFitError};

const ANALYSIS_FAILURE: &str = "Failed to analyze the avatar image.";

/// Fixed instruction sent alongside the photo
pub const DESCRIBE_INSTRUCTION: &str = "Briefly describe the person in this image. \
Focus on features relevant for generating a consistent fashion photo, like gender presentation, \
apparent age, ethnicity, hair style and color. Be concise, objective, and descriptive. \
Example: 'A young woman in her 20s with long, blonde wavy hair and fair skin.'";

/// Executor for avatar analysis
pub struct AvatarExecutor {
    gemini: GeminiClient,
}

impl AvatarExecutor {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Describe the person in a data-URL image
    pub async fn describe(&self, data_url: &str) -> Result<String, MatchFitError> {
        let image = InlineImage::from_data_url(data_url).map_err(|e| {
            warn!("Avatar is not a usable data URL: {}", e);
            MatchFitError::Validation(ANALYSIS_FAILURE.to_string())
        })?;

        info!("Analyzing avatar ({}, {} base64 chars)", image.mime_type, image.data.len());

        let text = self
            .gemini
            .generate_content(vec![Part::image(&image), Part::text(DESCRIBE_INSTRUCTION)], None)
            .await
            .map_err(|e| {
                warn!("Avatar analysis request failed: {}", e);
                MatchFitError::Provider(ANALYSIS_FAILURE.to_string())
            })?;

        clean_description(&text)
    }
}

/// Trim the description; an empty answer is a failure
pub fn clean_description(text: &str) -> Result<String, MatchFitError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        warn!("Avatar analysis returned no text");
        return Err(MatchFitError::EmptyResult(ANALYSIS_FAILURE.to_string()));
    }
    Ok(trimmed.to_string())
}

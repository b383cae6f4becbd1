//! ============================================================================
//! Gemini Client - Generative Text, Vision and Image Transport
//! ============================================================================
//! Thin transport over the Generative Language REST API:
//! - generateContent for text / JSON completions and image understanding
//! - predict (Imagen) for text-to-image generation
//! Every request goes through the retry wrapper; parsing the returned text
//! into domain types is left to the callers.
//! ============================================================================

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::http::post_json;
use crate::retry::{with_retry, RetryConfig};
use crate::types::InlineImage;

/// Client for the generative services
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    retry: RetryConfig,
}

impl GeminiClient {
    /// Create a client against the public endpoint with default models
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Create from app config; `None` when no Gemini key is configured
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            retry: config.retry(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a generateContent request and return the concatenated candidate text.
    /// An empty string means the service answered without any text part.
    pub async fn generate_content(
        &self,
        parts: Vec<Part>,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config,
        };

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let url = url.as_str();
        let request = &request;

        debug!("generateContent with model {}", self.text_model);

        let response: GenerateContentResponse = with_retry(&self.retry, "Gemini generateContent", || {
            post_json(client, "Gemini", url, api_key, request)
        })
        .await?;

        Ok(response.text())
    }

    /// Generate images from a prompt; an empty vec means the service produced none
    pub async fn generate_images(&self, prompt: &str, options: &ImageOptions) -> Result<Vec<InlineImage>> {
        info!("Generating image: {}...", prompt.trim().chars().take(50).collect::<String>());

        let url = format!("{}/models/{}:predict", self.base_url, self.image_model);
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: options.count,
                aspect_ratio: options.aspect_ratio.clone(),
                output_mime_type: options.mime_type.clone(),
            },
        };

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let url = url.as_str();
        let request = &request;

        let response: PredictResponse = with_retry(&self.retry, "Imagen predict", || {
            post_json(client, "Imagen", url, api_key, request)
        })
        .await?;

        let images: Vec<InlineImage> = response
            .predictions
            .into_iter()
            .filter_map(|p| {
                let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
                let mime = p.mime_type.unwrap_or_else(|| options.mime_type.clone());
                Some(InlineImage::new(mime, data))
            })
            .collect();

        info!("Image generation returned {} image(s)", images.len());
        Ok(images)
    }
}

/// Image generation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub count: u32,
    pub aspect_ratio: String,
    pub mime_type: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            count: 1,
            aspect_ratio: "3:4".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }
}

// ============================================================================
// generateContent Types
// ============================================================================

/// One request part: plain text or inline binary data
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(image: &InlineImage) -> Self {
        Part::InlineData(InlineData {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Generation options; `response_schema` constrains JSON output
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    /// JSON output constrained by `schema`
    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            temperature: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Imagen predict Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

//! ============================================================================
//! Core Types for MatchFit
//! ============================================================================
//! Defines the profile, occasion, weather and outfit records shared by the
//! provider clients and the session controller. Outfit types keep the
//! camelCase field names the generative service returns.
//! ============================================================================

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Profile Options
// ============================================================================

/// Body type options offered on the profile step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BodyType {
    #[default]
    Average,
    Athletic,
    Slim,
    Curvy,
    #[serde(rename = "Broad Shoulders")]
    BroadShoulders,
}

impl BodyType {
    pub const ALL: [BodyType; 5] = [
        BodyType::Average,
        BodyType::Athletic,
        BodyType::Slim,
        BodyType::Curvy,
        BodyType::BroadShoulders,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BodyType::Average => "Average",
            BodyType::Athletic => "Athletic",
            BodyType::Slim => "Slim",
            BodyType::Curvy => "Curvy",
            BodyType::BroadShoulders => "Broad Shoulders",
        }
    }
}

/// Style options offered on the profile step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Casual,
    Formal,
    Streetwear,
    Bohemian,
    Minimalist,
    Sporty,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Casual,
        Style::Formal,
        Style::Streetwear,
        Style::Bohemian,
        Style::Minimalist,
        Style::Sporty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Style::Casual => "Casual",
            Style::Formal => "Formal",
            Style::Streetwear => "Streetwear",
            Style::Bohemian => "Bohemian",
            Style::Minimalist => "Minimalist",
            Style::Sporty => "Sporty",
        }
    }
}

/// Fit options offered on the profile step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Fit {
    #[default]
    Comfortable,
    #[serde(rename = "Slim Fit")]
    SlimFit,
    Oversized,
    Tailored,
}

impl Fit {
    pub const ALL: [Fit; 4] = [Fit::Comfortable, Fit::SlimFit, Fit::Oversized, Fit::Tailored];

    pub fn label(&self) -> &'static str {
        match self {
            Fit::Comfortable => "Comfortable",
            Fit::SlimFit => "Slim Fit",
            Fit::Oversized => "Oversized",
            Fit::Tailored => "Tailored",
        }
    }
}

macro_rules! option_display_and_parse {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = MatchFitError;

            /// Accepts the display label case-insensitively ("slim fit", "Slim Fit")
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|option| option.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let valid: Vec<&str> = $ty::ALL.iter().map(|o| o.label()).collect();
                        MatchFitError::Validation(format!(
                            "Unknown {} '{}'. Valid values: {}",
                            $what,
                            wanted,
                            valid.join(", ")
                        ))
                    })
            }
        }
    };
}

option_display_and_parse!(BodyType, "body type");
option_display_and_parse!(Style, "style");
option_display_and_parse!(Fit, "fit");

/// Occasions offered on the context step. The context itself stores a free
/// string because "today's look" synthesizes an occasion outside this list.
pub const OCCASION_OPTIONS: [&str; 6] = [
    "Everyday Wear",
    "Office / Business Casual",
    "Wedding Guest",
    "Night Out / Party",
    "Workout / Gym",
    "Formal Event",
];

// ============================================================================
// Session Records
// ============================================================================

/// Image carried inline as a data URL (`data:<mime>;base64,<payload>`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload without the data-URL header
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Split a data URL into its MIME type and base64 payload
    pub fn from_data_url(url: &str) -> Result<Self, MatchFitError> {
        let invalid = || MatchFitError::Validation("Image is not a base64 data URL.".into());

        let rest = url.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;

        if mime_type.is_empty() || data.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(mime_type, data))
    }

    /// Encode raw image bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Raw image bytes
    pub fn decode(&self) -> Result<Vec<u8>, MatchFitError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| MatchFitError::Validation(format!("Image payload is not valid base64: {}", e)))
    }
}

/// User profile built on the profile step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub body_type: BodyType,
    pub style: Style,
    pub colors: Vec<String>,
    pub fit: Fit,
    /// Uploaded photo as a data URL
    pub avatar_image: Option<String>,
    /// Derived from the photo by the vision service
    pub avatar_description: Option<String>,
}

/// Fields submitted by the profile step (avatar fields are managed separately)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileForm {
    pub body_type: BodyType,
    pub style: Style,
    pub colors: Vec<String>,
    pub fit: Fit,
}

impl ProfileForm {
    /// Parse a comma-separated colour list, dropping blank entries
    pub fn parse_colors(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl UserProfile {
    /// Merge a profile-step submission, keeping the avatar fields
    pub fn merge_form(&mut self, form: ProfileForm) {
        self.body_type = form.body_type;
        self.style = form.style;
        self.colors = form.colors;
        self.fit = form.fit;
    }
}

/// Occasion and weather used to condition recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccasionContext {
    pub occasion: String,
    pub weather: String,
}

impl Default for OccasionContext {
    fn default() -> Self {
        Self {
            occasion: "Everyday Wear".to_string(),
            weather: "Mild and sunny, about 20°C".to_string(),
        }
    }
}

/// Normalized weather record, produced wholesale by the weather client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    /// Celsius
    pub temperature: f64,
    /// Celsius
    pub feels_like: f64,
    /// Percent
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    /// Chance of rain as a percentage
    #[serde(default)]
    pub rain: f64,
    pub condition: String,
    pub summary: String,
}

/// One clothing item in an outfit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutfitItem {
    pub name: String,
    pub description: String,
}

/// Outfit as returned by the generative service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitRecommendation {
    pub outfit_name: String,
    pub description: String,
    pub items: Vec<OutfitItem>,
}

/// Recommendation plus its on-demand visualization state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualizedOutfit {
    /// Stable id; visualization results are matched by id, never by position
    pub id: Uuid,
    pub outfit: OutfitRecommendation,
    pub image_url: Option<String>,
    pub is_loading_image: bool,
}

impl VisualizedOutfit {
    pub fn new(outfit: OutfitRecommendation) -> Self {
        Self {
            id: Uuid::new_v4(),
            outfit,
            image_url: None,
            is_loading_image: false,
        }
    }

    /// Whether a visualization may be started for this item
    pub fn can_visualize(&self) -> bool {
        !self.is_loading_image && self.image_url.is_none()
    }
}

/// Session steps, in forward order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Home,
    Profile,
    Context,
    Results,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Home => "home",
            Step::Profile => "profile",
            Step::Context => "context",
            Step::Results => "results",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure categories surfaced by the provider clients. Each variant carries
/// the single user-facing message for the failed operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
pub enum MatchFitError {
    /// Required input missing, checked before any network call
    #[error("{0}")]
    Validation(String),

    /// Network failure or non-success status from a provider
    #[error("{0}")]
    Provider(String),

    /// Response did not parse into the expected shape
    #[error("{0}")]
    Schema(String),

    /// Provider answered but returned nothing usable
    #[error("{0}")]
    EmptyResult(String),
}

impl MatchFitError {
    pub fn message(&self) -> &str {
        match self {
            MatchFitError::Validation(m)
            | MatchFitError::Provider(m)
            | MatchFitError::Schema(m)
            | MatchFitError::EmptyResult(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_parsing_is_case_insensitive() {
        assert_eq!("slim fit".parse::<Fit>().unwrap(), Fit::SlimFit);
        assert_eq!("Broad Shoulders".parse::<BodyType>().unwrap(), BodyType::BroadShoulders);
        assert_eq!(" sporty ".parse::<Style>().unwrap(), Style::Sporty);
    }

    #[test]
    fn test_option_parsing_rejects_unknown() {
        let err = "baggy".parse::<Fit>().unwrap_err();
        assert!(matches!(err, MatchFitError::Validation(_)));
        assert!(err.message().contains("Slim Fit"));
    }

    #[test]
    fn test_option_serde_uses_labels() {
        let json = serde_json::to_string(&Fit::SlimFit).unwrap();
        assert_eq!(json, "\"Slim Fit\"");
        let parsed: BodyType = serde_json::from_str("\"Broad Shoulders\"").unwrap();
        assert_eq!(parsed, BodyType::BroadShoulders);
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(
            ProfileForm::parse_colors("navy, grey ,, forest green "),
            vec!["navy", "grey", "forest green"]
        );
        assert!(ProfileForm::parse_colors("  ").is_empty());
    }

    #[test]
    fn test_merge_form_keeps_avatar() {
        let mut profile = UserProfile {
            avatar_image: Some("data:image/png;base64,AAAA".into()),
            avatar_description: Some("A tall man".into()),
            ..Default::default()
        };

        profile.merge_form(ProfileForm {
            body_type: BodyType::Athletic,
            style: Style::Sporty,
            colors: vec!["navy".into()],
            fit: Fit::SlimFit,
        });

        assert_eq!(profile.body_type, BodyType::Athletic);
        assert_eq!(profile.colors, vec!["navy"]);
        assert_eq!(profile.avatar_description.as_deref(), Some("A tall man"));
        assert!(profile.avatar_image.is_some());
    }

    #[test]
    fn test_inline_image_from_data_url() {
        let image = InlineImage::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_inline_image_bytes() {
        let image = InlineImage::from_bytes("image/jpeg", b"ABC");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,QUJD");
        assert_eq!(image.decode().unwrap(), b"ABC".to_vec());
        assert!(InlineImage::new("image/jpeg", "not base64!").decode().is_err());
    }

    #[test]
    fn test_inline_image_rejects_malformed() {
        for bad in ["", "image/png;base64,AAA", "data:image/png,AAA", "data:;base64,AAA", "data:image/png;base64,"] {
            assert!(InlineImage::from_data_url(bad).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_outfit_wire_names() {
        let json = r#"{"outfitName":"Urban Explorer","description":"d","items":[{"name":"Chinos","description":"Slim"}]}"#;
        let outfit: OutfitRecommendation = serde_json::from_str(json).unwrap();
        assert_eq!(outfit.outfit_name, "Urban Explorer");
        assert_eq!(outfit.items.len(), 1);
    }

    #[test]
    fn test_visualized_outfit_guard() {
        let outfit = OutfitRecommendation {
            outfit_name: "x".into(),
            description: "y".into(),
            items: vec![],
        };
        let mut item = VisualizedOutfit::new(outfit);
        assert!(item.can_visualize());
        item.is_loading_image = true;
        assert!(!item.can_visualize());
        item.is_loading_image = false;
        item.image_url = Some("data:image/jpeg;base64,AA".into());
        assert!(!item.can_visualize());
    }
}

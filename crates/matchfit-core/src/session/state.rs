//! ============================================================================
//! Session State - Reducer for the Styling Session
//! ============================================================================
//! Every mutation of the session is a `SessionEvent` applied through
//! `SessionState::apply`. Events that do not fit the current step, or that
//! carry results for a list, avatar, or weather fetch that has since been
//! replaced, are rejected with a `TransitionError` and leave the state untouched.
//! ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{
    OccasionContext, OutfitRecommendation, ProfileForm, Step, UserProfile, VisualizedOutfit,
    WeatherReport,
};

/// Complete in-memory session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionState {
    pub step: Step,
    pub profile: UserProfile,
    pub context: OccasionContext,
    pub recommendations: Vec<VisualizedOutfit>,
    pub is_loading: bool,
    /// Global error shown on the results and home views
    pub error: Option<String>,
    pub weather: Option<WeatherReport>,
    pub is_loading_weather: bool,
    pub weather_error: Option<String>,
    pub is_processing_avatar: bool,
    /// Bumped whenever the recommendation list is replaced or cleared
    generation: u64,
    /// Bumped whenever the avatar image changes
    avatar_generation: u64,
    /// Bumped whenever a weather fetch starts
    weather_generation: u64,
}

/// Inputs to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StartSession,
    SubmitProfile(ProfileForm),
    BackToProfile,
    /// Context submitted (or synthesized by today's look); enters loading
    RequestRecommendations(OccasionContext),
    RecommendationsLoaded {
        generation: u64,
        outfits: Vec<OutfitRecommendation>,
    },
    RecommendationsFailed {
        generation: u64,
        message: String,
    },
    Reset,
    /// Location failed local validation; no fetch is started
    WeatherRejected(String),
    WeatherRequested,
    WeatherLoaded {
        generation: u64,
        report: WeatherReport,
    },
    WeatherFailed {
        generation: u64,
        message: String,
    },
    AvatarCleared,
    AvatarSelected(String),
    AvatarDescribed {
        generation: u64,
        description: String,
    },
    AvatarFailed {
        generation: u64,
        message: String,
    },
    VisualizationStarted {
        outfit_id: Uuid,
    },
    VisualizationSucceeded {
        generation: u64,
        outfit_id: Uuid,
        image_url: String,
    },
    VisualizationFailed {
        generation: u64,
        outfit_id: Uuid,
        message: String,
    },
    ErrorRaised(String),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartSession => "start_session",
            SessionEvent::SubmitProfile(_) => "submit_profile",
            SessionEvent::BackToProfile => "back_to_profile",
            SessionEvent::RequestRecommendations(_) => "request_recommendations",
            SessionEvent::RecommendationsLoaded { .. } => "recommendations_loaded",
            SessionEvent::RecommendationsFailed { .. } => "recommendations_failed",
            SessionEvent::Reset => "reset",
            SessionEvent::WeatherRejected(_) => "weather_rejected",
            SessionEvent::WeatherRequested => "weather_requested",
            SessionEvent::WeatherLoaded { .. } => "weather_loaded",
            SessionEvent::WeatherFailed { .. } => "weather_failed",
            SessionEvent::AvatarCleared => "avatar_cleared",
            SessionEvent::AvatarSelected(_) => "avatar_selected",
            SessionEvent::AvatarDescribed { .. } => "avatar_described",
            SessionEvent::AvatarFailed { .. } => "avatar_failed",
            SessionEvent::VisualizationStarted { .. } => "visualization_started",
            SessionEvent::VisualizationSucceeded { .. } => "visualization_succeeded",
            SessionEvent::VisualizationFailed { .. } => "visualization_failed",
            SessionEvent::ErrorRaised(_) => "error_raised",
        }
    }
}

/// Why an event was not applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{event} is not allowed on the {step} step")]
    InvalidStep { event: &'static str, step: Step },

    #[error("stale {event} for generation {generation} (current {current})")]
    Stale {
        event: &'static str,
        generation: u64,
        current: u64,
    },

    #[error("outfit {0} is not in the current recommendations")]
    UnknownOutfit(Uuid),

    #[error("outfit {0} already has an image or one is being generated")]
    AlreadyVisualizing(Uuid),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the current recommendation list
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation of the current avatar image
    pub fn avatar_generation(&self) -> u64 {
        self.avatar_generation
    }

    /// Generation of the latest weather fetch
    pub fn weather_generation(&self) -> u64 {
        self.weather_generation
    }

    pub fn outfit(&self, id: Uuid) -> Option<&VisualizedOutfit> {
        self.recommendations.iter().find(|o| o.id == id)
    }

    /// Apply one event. On error the state is unchanged.
    pub fn apply(&mut self, event: SessionEvent) -> Result<(), TransitionError> {
        let name = event.name();

        match event {
            SessionEvent::StartSession => {
                self.expect_step(name, &[Step::Home])?;
                self.step = Step::Profile;
            }

            SessionEvent::SubmitProfile(form) => {
                self.expect_step(name, &[Step::Profile])?;
                self.profile.merge_form(form);
                self.step = Step::Context;
            }

            SessionEvent::BackToProfile => {
                self.expect_step(name, &[Step::Context])?;
                self.step = Step::Profile;
            }

            SessionEvent::RequestRecommendations(context) => {
                // Home is allowed for the today's-look shortcut
                self.expect_step(name, &[Step::Context, Step::Home])?;
                self.context = context;
                self.step = Step::Results;
                self.is_loading = true;
                self.error = None;
                self.recommendations.clear();
                self.generation += 1;
            }

            SessionEvent::RecommendationsLoaded {
                generation,
                outfits,
            } => {
                self.expect_generation(name, generation)?;
                self.recommendations = outfits.into_iter().map(VisualizedOutfit::new).collect();
                self.is_loading = false;
            }

            SessionEvent::RecommendationsFailed {
                generation,
                message,
            } => {
                self.expect_generation(name, generation)?;
                self.recommendations.clear();
                self.is_loading = false;
                self.error = Some(format!("An error occurred: {}", message));
            }

            SessionEvent::Reset => {
                self.expect_step(name, &[Step::Results])?;
                self.step = Step::Home;
                self.recommendations.clear();
                self.error = None;
                self.is_loading = false;
                self.generation += 1;
            }

            SessionEvent::WeatherRejected(message) => {
                self.weather_error = Some(message);
            }

            SessionEvent::WeatherRequested => {
                self.is_loading_weather = true;
                self.weather_error = None;
                self.weather = None;
                self.weather_generation += 1;
            }

            SessionEvent::WeatherLoaded { generation, report } => {
                self.expect_tag(name, generation, self.weather_generation)?;
                self.weather = Some(report);
                self.is_loading_weather = false;
            }

            SessionEvent::WeatherFailed {
                generation,
                message,
            } => {
                self.expect_tag(name, generation, self.weather_generation)?;
                self.weather_error = Some(message);
                self.is_loading_weather = false;
            }

            SessionEvent::AvatarCleared => {
                self.profile.avatar_image = None;
                self.profile.avatar_description = None;
                self.is_processing_avatar = false;
                self.avatar_generation += 1;
            }

            SessionEvent::AvatarSelected(image) => {
                self.profile.avatar_image = Some(image);
                self.profile.avatar_description = None;
                self.is_processing_avatar = true;
                self.avatar_generation += 1;
            }

            SessionEvent::AvatarDescribed {
                generation,
                description,
            } => {
                self.expect_avatar_generation(name, generation)?;
                self.profile.avatar_description = Some(description);
                self.is_processing_avatar = false;
            }

            SessionEvent::AvatarFailed {
                generation,
                message,
            } => {
                self.expect_avatar_generation(name, generation)?;
                self.is_processing_avatar = false;
                self.error = Some(format!("Failed to process avatar: {}", message));
            }

            SessionEvent::VisualizationStarted { outfit_id } => {
                let outfit = self.outfit_mut(outfit_id)?;
                if !outfit.can_visualize() {
                    return Err(TransitionError::AlreadyVisualizing(outfit_id));
                }
                outfit.is_loading_image = true;
            }

            SessionEvent::VisualizationSucceeded {
                generation,
                outfit_id,
                image_url,
            } => {
                self.expect_generation(name, generation)?;
                let outfit = self.outfit_mut(outfit_id)?;
                outfit.image_url = Some(image_url);
                outfit.is_loading_image = false;
            }

            SessionEvent::VisualizationFailed {
                generation,
                outfit_id,
                message,
            } => {
                self.expect_generation(name, generation)?;
                self.outfit_mut(outfit_id)?.is_loading_image = false;
                self.error = Some(format!("Failed to generate image: {}", message));
            }

            SessionEvent::ErrorRaised(message) => {
                self.error = Some(message);
            }
        }

        Ok(())
    }

    fn expect_step(&self, event: &'static str, allowed: &[Step]) -> Result<(), TransitionError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(TransitionError::InvalidStep {
                event,
                step: self.step,
            })
        }
    }

    fn expect_generation(&self, event: &'static str, generation: u64) -> Result<(), TransitionError> {
        self.expect_tag(event, generation, self.generation)
    }

    fn expect_avatar_generation(&self, event: &'static str, generation: u64) -> Result<(), TransitionError> {
        self.expect_tag(event, generation, self.avatar_generation)
    }

    fn expect_tag(&self, event: &'static str, generation: u64, current: u64) -> Result<(), TransitionError> {
        if generation == current {
            Ok(())
        } else {
            Err(TransitionError::Stale {
                event,
                generation,
                current,
            })
        }
    }

    fn outfit_mut(&mut self, id: Uuid) -> Result<&mut VisualizedOutfit, TransitionError> {
        self.recommendations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(TransitionError::UnknownOutfit(id))
    }
}

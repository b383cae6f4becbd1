//! ============================================================================
//! Session Controller - Async Orchestration of the Styling Flow
//! ============================================================================
//! Runs the user-facing operations against a `StylistBackend` and feeds every
//! outcome back through the reducer. The lock is never held across a backend
//! call, so weather, avatar analysis, and per-outfit visualizations can be in
//! flight at the same time. Late results are tagged with the generation they
//! were started under and dropped by the reducer if the list, avatar, or
//! weather fetch has been superseded since.
//! ============================================================================

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::StylistBackend;
use super::state::{SessionEvent, SessionState, TransitionError};
use crate::types::{MatchFitError, OccasionContext, ProfileForm, WeatherReport};

pub const NO_WEATHER_FOR_LOOK: &str = "Weather data is not available to make a recommendation.";

/// Occasion used by the today's-look shortcut
pub const TODAYS_LOOK_OCCASION: &str = "Everyday Wear based on today's weather";

/// Failure of a controller operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Service(#[from] MatchFitError),
}

/// Context synthesized from a weather report
pub fn todays_context(weather: &WeatherReport) -> OccasionContext {
    OccasionContext {
        occasion: TODAYS_LOOK_OCCASION.to_string(),
        weather: format!("{}, around {}°C", weather.condition, weather.temperature),
    }
}

/// Shared handle to one styling session
#[derive(Clone)]
pub struct SessionController {
    state: Arc<RwLock<SessionState>>,
    backend: Arc<dyn StylistBackend>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn StylistBackend>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::new())),
            backend,
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    async fn dispatch(&self, event: SessionEvent) -> Result<(), TransitionError> {
        let name = event.name();
        let result = self.state.write().await.apply(event);
        match &result {
            Ok(()) => debug!("Applied {}", name),
            Err(e) => debug!("Rejected {}: {}", name, e),
        }
        result
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn start_session(&self) -> Result<(), SessionError> {
        Ok(self.dispatch(SessionEvent::StartSession).await?)
    }

    pub async fn submit_profile(&self, form: ProfileForm) -> Result<(), SessionError> {
        Ok(self.dispatch(SessionEvent::SubmitProfile(form)).await?)
    }

    pub async fn back_to_profile(&self) -> Result<(), SessionError> {
        Ok(self.dispatch(SessionEvent::BackToProfile).await?)
    }

    /// Return home; in-flight results for the old list are discarded
    pub async fn reset(&self) -> Result<(), SessionError> {
        info!("Resetting session");
        Ok(self.dispatch(SessionEvent::Reset).await?)
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    /// Submit a context and wait for the recommendations
    pub async fn submit_context(&self, context: OccasionContext) -> Result<(), SessionError> {
        let (generation, profile) = {
            let mut state = self.state.write().await;
            state.apply(SessionEvent::RequestRecommendations(context.clone()))?;
            (state.generation(), state.profile.clone())
        };

        info!("Requesting recommendations (generation {})", generation);

        match self.backend.recommend(&profile, &context).await {
            Ok(outfits) => {
                self.dispatch(SessionEvent::RecommendationsLoaded { generation, outfits })
                    .await?;
                Ok(())
            }
            Err(e) => {
                warn!("Recommendations failed: {}", e);
                self.dispatch(SessionEvent::RecommendationsFailed {
                    generation,
                    message: e.message().to_string(),
                })
                .await?;
                Err(e.into())
            }
        }
    }

    /// Recommendations for the current weather with a synthesized context
    pub async fn todays_look(&self) -> Result<(), SessionError> {
        let weather = self.state.read().await.weather.clone();

        let Some(weather) = weather else {
            warn!("Today's look requested without weather");
            self.dispatch(SessionEvent::ErrorRaised(NO_WEATHER_FOR_LOOK.to_string()))
                .await?;
            return Err(MatchFitError::Validation(NO_WEATHER_FOR_LOOK.to_string()).into());
        };

        self.submit_context(todays_context(&weather)).await
    }

    // ========================================================================
    // Visualization
    // ========================================================================

    /// Generate an image for one outfit.
    ///
    /// Returns `Ok(false)` without calling the backend when the outfit already
    /// has an image or one is being generated.
    pub async fn visualize(&self, outfit_id: Uuid) -> Result<bool, SessionError> {
        let (generation, outfit, profile) = {
            let mut state = self.state.write().await;
            match state.apply(SessionEvent::VisualizationStarted { outfit_id }) {
                Ok(()) => {}
                Err(TransitionError::AlreadyVisualizing(_)) => {
                    debug!("Outfit {} already visualized or loading", outfit_id);
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
            let outfit = state
                .outfit(outfit_id)
                .map(|o| o.outfit.clone())
                .ok_or(TransitionError::UnknownOutfit(outfit_id))?;
            (state.generation(), outfit, state.profile.clone())
        };

        match self.backend.visualize(&outfit, &profile).await {
            Ok(image_url) => {
                info!("Image ready for '{}'", outfit.outfit_name);
                self.dispatch(SessionEvent::VisualizationSucceeded {
                    generation,
                    outfit_id,
                    image_url,
                })
                .await?;
                Ok(true)
            }
            Err(e) => {
                warn!("Visualization of '{}' failed: {}", outfit.outfit_name, e);
                self.dispatch(SessionEvent::VisualizationFailed {
                    generation,
                    outfit_id,
                    message: e.message().to_string(),
                })
                .await?;
                Err(e.into())
            }
        }
    }

    /// Visualize by position in the current list
    pub async fn visualize_index(&self, index: usize) -> Result<bool, SessionError> {
        let id = self.state.read().await.recommendations.get(index).map(|o| o.id);
        match id {
            Some(id) => self.visualize(id).await,
            None => Err(MatchFitError::Validation(format!("No outfit at position {}.", index + 1)).into()),
        }
    }

    // ========================================================================
    // Weather and Avatar
    // ========================================================================

    /// Fetch weather for a location; blank input never starts a request
    pub async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, SessionError> {
        if location.trim().is_empty() {
            let err = MatchFitError::Validation("Please enter a location.".to_string());
            self.dispatch(SessionEvent::WeatherRejected(err.message().to_string()))
                .await?;
            return Err(err.into());
        }

        let generation = {
            let mut state = self.state.write().await;
            state.apply(SessionEvent::WeatherRequested)?;
            state.weather_generation()
        };

        match self.backend.fetch_weather(location).await {
            Ok(report) => {
                self.dispatch(SessionEvent::WeatherLoaded {
                    generation,
                    report: report.clone(),
                })
                .await?;
                Ok(report)
            }
            Err(e) => {
                self.dispatch(SessionEvent::WeatherFailed {
                    generation,
                    message: e.message().to_string(),
                })
                .await?;
                Err(e.into())
            }
        }
    }

    /// Set or clear the avatar. A new image is analyzed immediately and its
    /// description is returned once stored.
    pub async fn set_avatar(&self, image: Option<String>) -> Result<Option<String>, SessionError> {
        let Some(image) = image else {
            self.dispatch(SessionEvent::AvatarCleared).await?;
            return Ok(None);
        };

        let generation = {
            let mut state = self.state.write().await;
            state.apply(SessionEvent::AvatarSelected(image.clone()))?;
            state.avatar_generation()
        };

        match self.backend.describe_avatar(&image).await {
            Ok(description) => {
                info!("Avatar described: {}", description);
                self.dispatch(SessionEvent::AvatarDescribed {
                    generation,
                    description: description.clone(),
                })
                .await?;
                Ok(Some(description))
            }
            Err(e) => {
                warn!("Avatar analysis failed: {}", e);
                self.dispatch(SessionEvent::AvatarFailed {
                    generation,
                    message: e.message().to_string(),
                })
                .await?;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutfitItem, OutfitRecommendation, Step, UserProfile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    fn outfit(name: &str) -> OutfitRecommendation {
        OutfitRecommendation {
            outfit_name: name.into(),
            description: format!("{} look", name),
            items: vec![OutfitItem {
                name: "Shirt".into(),
                description: "White".into(),
            }],
        }
    }

    fn london() -> WeatherReport {
        WeatherReport {
            location: "London".into(),
            temperature: 12.0,
            feels_like: 11.0,
            humidity: 70.0,
            wind_speed: 12.0,
            rain: 30.0,
            condition: "Clouds".into(),
            summary: "Cloudy at 12°C, feeling like 11°C.".into(),
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        fail_recommend: bool,
        fail_visualize: bool,
        /// When set, visualize waits for a permit before answering
        visualize_gate: Option<Arc<Semaphore>>,
        /// When set, weather for "Slowtown" waits for a permit before answering
        weather_gate: Option<Arc<Semaphore>>,
        recommend_calls: AtomicUsize,
        visualize_calls: AtomicUsize,
        contexts: Mutex<Vec<OccasionContext>>,
        visualize_profiles: Mutex<Vec<UserProfile>>,
    }

    #[async_trait]
    impl StylistBackend for FakeBackend {
        async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, MatchFitError> {
            if location == "Atlantis" {
                return Err(MatchFitError::Provider(
                    "Failed to get weather for that location. Please try again.".into(),
                ));
            }
            if location == "Slowtown" {
                if let Some(gate) = &self.weather_gate {
                    gate.acquire().await.unwrap().forget();
                }
                let mut report = london();
                report.location = "Slowtown".into();
                return Ok(report);
            }
            Ok(london())
        }

        async fn recommend(
            &self,
            _profile: &UserProfile,
            context: &OccasionContext,
        ) -> Result<Vec<OutfitRecommendation>, MatchFitError> {
            self.recommend_calls.fetch_add(1, Ordering::SeqCst);
            self.contexts.lock().unwrap().push(context.clone());
            if self.fail_recommend {
                return Err(MatchFitError::Schema(
                    "Failed to parse recommendations from the AI. Please try again.".into(),
                ));
            }
            Ok(vec![outfit("A"), outfit("B"), outfit("C")])
        }

        async fn describe_avatar(&self, data_url: &str) -> Result<String, MatchFitError> {
            if data_url.starts_with("data:") {
                Ok("A man in his 30s with short dark hair".into())
            } else {
                Err(MatchFitError::Validation("Failed to analyze the avatar image.".into()))
            }
        }

        async fn visualize(
            &self,
            outfit: &OutfitRecommendation,
            profile: &UserProfile,
        ) -> Result<String, MatchFitError> {
            self.visualize_calls.fetch_add(1, Ordering::SeqCst);
            self.visualize_profiles.lock().unwrap().push(profile.clone());
            if let Some(gate) = &self.visualize_gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail_visualize {
                return Err(MatchFitError::EmptyResult(
                    "The AI failed to create an image for this outfit.".into(),
                ));
            }
            Ok(format!("data:image/jpeg;base64,{}", outfit.outfit_name))
        }
    }

    async fn at_results(backend: Arc<FakeBackend>) -> SessionController {
        let controller = SessionController::new(backend);
        controller.start_session().await.unwrap();
        controller.submit_profile(ProfileForm::default()).await.unwrap();
        controller.submit_context(OccasionContext::default()).await.unwrap();
        controller
    }

    async fn wait_until_loading(controller: &SessionController, index: usize) {
        for _ in 0..1000 {
            if controller.snapshot().await.recommendations[index].is_loading_image {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("outfit {} never started loading", index);
    }

    #[tokio::test]
    async fn test_full_flow() {
        let backend = Arc::new(FakeBackend::default());
        let controller = at_results(backend.clone()).await;

        let state = controller.snapshot().await;
        assert_eq!(state.step, Step::Results);
        assert!(!state.is_loading);
        assert_eq!(state.recommendations.len(), 3);
        assert!(state.error.is_none());
        assert_eq!(backend.recommend_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recommendation_failure() {
        let backend = Arc::new(FakeBackend {
            fail_recommend: true,
            ..Default::default()
        });
        let controller = SessionController::new(backend);
        controller.start_session().await.unwrap();
        controller.submit_profile(ProfileForm::default()).await.unwrap();

        let err = controller.submit_context(OccasionContext::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::Service(MatchFitError::Schema(_))));

        let state = controller.snapshot().await;
        assert_eq!(state.step, Step::Results);
        assert!(!state.is_loading);
        assert!(state.recommendations.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("An error occurred: Failed to parse recommendations from the AI. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_visualize_updates_only_target() {
        let controller = at_results(Arc::new(FakeBackend::default())).await;
        let before = controller.snapshot().await;

        assert!(controller.visualize_index(1).await.unwrap());

        let after = controller.snapshot().await;
        assert_eq!(after.recommendations[1].image_url.as_deref(), Some("data:image/jpeg;base64,B"));
        assert!(!after.recommendations[1].is_loading_image);
        assert_eq!(after.recommendations[0], before.recommendations[0]);
        assert_eq!(after.recommendations[2], before.recommendations[2]);
    }

    #[tokio::test]
    async fn test_visualize_twice_is_noop() {
        let backend = Arc::new(FakeBackend::default());
        let controller = at_results(backend.clone()).await;

        assert!(controller.visualize_index(0).await.unwrap());
        assert!(!controller.visualize_index(0).await.unwrap());
        assert_eq!(backend.visualize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_visualize_while_loading_is_noop() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(FakeBackend {
            visualize_gate: Some(gate.clone()),
            ..Default::default()
        });
        let controller = at_results(backend.clone()).await;

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.visualize_index(0).await })
        };
        wait_until_loading(&controller, 0).await;

        assert!(!controller.visualize_index(0).await.unwrap());

        gate.add_permits(1);
        assert!(first.await.unwrap().unwrap());
        assert_eq!(backend.visualize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_visualizations_are_independent() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(FakeBackend {
            visualize_gate: Some(gate.clone()),
            ..Default::default()
        });
        let controller = at_results(backend).await;

        let tasks: Vec<_> = [0usize, 2]
            .into_iter()
            .map(|index| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.visualize_index(index).await })
            })
            .collect();
        wait_until_loading(&controller, 0).await;
        wait_until_loading(&controller, 2).await;

        let mid = controller.snapshot().await;
        assert!(!mid.recommendations[1].is_loading_image);

        gate.add_permits(2);
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let state = controller.snapshot().await;
        assert_eq!(state.recommendations[0].image_url.as_deref(), Some("data:image/jpeg;base64,A"));
        assert_eq!(state.recommendations[2].image_url.as_deref(), Some("data:image/jpeg;base64,C"));
        assert!(state.recommendations[1].image_url.is_none());
    }

    #[tokio::test]
    async fn test_visualization_failure_sets_error() {
        let backend = Arc::new(FakeBackend {
            fail_visualize: true,
            ..Default::default()
        });
        let controller = at_results(backend).await;

        assert!(controller.visualize_index(0).await.is_err());

        let state = controller.snapshot().await;
        assert!(!state.recommendations[0].is_loading_image);
        assert!(state.recommendations[0].image_url.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to generate image: The AI failed to create an image for this outfit.")
        );
    }

    #[tokio::test]
    async fn test_reset_discards_inflight_visualization() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(FakeBackend {
            visualize_gate: Some(gate.clone()),
            ..Default::default()
        });
        let controller = at_results(backend).await;

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.visualize_index(0).await })
        };
        wait_until_loading(&controller, 0).await;

        controller.reset().await.unwrap();
        gate.add_permits(1);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::Transition(TransitionError::Stale { .. })));

        let state = controller.snapshot().await;
        assert_eq!(state.step, Step::Home);
        assert!(state.recommendations.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_reset_keeps_profile_and_weather() {
        let controller = at_results(Arc::new(FakeBackend::default())).await;
        controller.fetch_weather("London").await.unwrap();
        let profile = controller.snapshot().await.profile;

        controller.reset().await.unwrap();

        let state = controller.snapshot().await;
        assert_eq!(state.profile, profile);
        assert_eq!(state.weather, Some(london()));
    }

    #[tokio::test]
    async fn test_todays_look_without_weather() {
        let backend = Arc::new(FakeBackend::default());
        let controller = SessionController::new(backend.clone());

        let err = controller.todays_look().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Service(MatchFitError::Validation(NO_WEATHER_FOR_LOOK.into()))
        );

        let state = controller.snapshot().await;
        assert_eq!(state.step, Step::Home);
        assert_eq!(state.error.as_deref(), Some(NO_WEATHER_FOR_LOOK));
        assert_eq!(backend.recommend_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_todays_look_uses_weather_context() {
        let backend = Arc::new(FakeBackend::default());
        let controller = SessionController::new(backend.clone());
        controller.fetch_weather("London").await.unwrap();

        controller.todays_look().await.unwrap();

        let state = controller.snapshot().await;
        assert_eq!(state.step, Step::Results);
        assert_eq!(state.recommendations.len(), 3);
        let sent = backend.contexts.lock().unwrap()[0].clone();
        assert_eq!(sent.occasion, "Everyday Wear based on today's weather");
        assert_eq!(sent.weather, "Clouds, around 12°C");
        assert_eq!(state.context, sent);
    }

    #[tokio::test]
    async fn test_weather_blank_and_failure() {
        let controller = SessionController::new(Arc::new(FakeBackend::default()));

        assert!(controller.fetch_weather("  ").await.is_err());
        let state = controller.snapshot().await;
        assert!(!state.is_loading_weather);
        assert_eq!(state.weather_error.as_deref(), Some("Please enter a location."));

        assert!(controller.fetch_weather("Atlantis").await.is_err());
        let state = controller.snapshot().await;
        assert!(!state.is_loading_weather);
        assert!(state.weather.is_none());
        assert_eq!(
            state.weather_error.as_deref(),
            Some("Failed to get weather for that location. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_slow_weather_fetch_does_not_overwrite_newer() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(FakeBackend {
            weather_gate: Some(gate.clone()),
            ..Default::default()
        });
        let controller = SessionController::new(backend);

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.fetch_weather("Slowtown").await })
        };
        for _ in 0..1000 {
            if controller.snapshot().await.weather_generation() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(controller.snapshot().await.is_loading_weather);

        let report = controller.fetch_weather("London").await.unwrap();
        assert_eq!(report.location, "London");

        gate.add_permits(1);
        let late = slow.await.unwrap();
        assert!(matches!(
            late,
            Err(SessionError::Transition(TransitionError::Stale { .. }))
        ));

        let state = controller.snapshot().await;
        assert_eq!(state.weather.as_ref().map(|w| w.location.as_str()), Some("London"));
        assert!(!state.is_loading_weather);
        assert!(state.weather_error.is_none());
    }

    #[tokio::test]
    async fn test_avatar_description_reaches_visualization() {
        let backend = Arc::new(FakeBackend::default());
        let controller = SessionController::new(backend.clone());
        controller.start_session().await.unwrap();

        let description = controller
            .set_avatar(Some("data:image/png;base64,AAAA".into()))
            .await
            .unwrap();
        assert_eq!(description.as_deref(), Some("A man in his 30s with short dark hair"));
        assert!(!controller.snapshot().await.is_processing_avatar);

        controller.submit_profile(ProfileForm::default()).await.unwrap();
        controller.submit_context(OccasionContext::default()).await.unwrap();
        controller.visualize_index(0).await.unwrap();

        let profiles = backend.visualize_profiles.lock().unwrap();
        assert_eq!(
            profiles[0].avatar_description.as_deref(),
            Some("A man in his 30s with short dark hair")
        );
    }

    #[tokio::test]
    async fn test_avatar_failure_and_clear() {
        let controller = SessionController::new(Arc::new(FakeBackend::default()));

        assert!(controller.set_avatar(Some("not-a-data-url".into())).await.is_err());
        let state = controller.snapshot().await;
        assert!(!state.is_processing_avatar);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to process avatar: Failed to analyze the avatar image.")
        );

        assert_eq!(controller.set_avatar(None).await.unwrap(), None);
        let state = controller.snapshot().await;
        assert!(state.profile.avatar_image.is_none());
        assert!(state.profile.avatar_description.is_none());
    }

    #[tokio::test]
    async fn test_visualize_index_out_of_range() {
        let controller = at_results(Arc::new(FakeBackend::default())).await;
        let err = controller.visualize_index(7).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Service(MatchFitError::Validation("No outfit at position 8.".into()))
        );
    }
}

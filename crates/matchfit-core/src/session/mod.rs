//! ============================================================================
//! Session Module - Styling Session State and Orchestration
//! ============================================================================
//! - `state`: pure reducer over `SessionEvent`
//! - `backend`: `StylistBackend` seam and the live provider wiring
//! - `controller`: async operations that drive the reducer
//! ============================================================================

mod backend;
mod controller;
mod state;

pub use backend::{LiveBackend, StylistBackend};
pub use controller::{
    todays_context, SessionController, SessionError, NO_WEATHER_FOR_LOOK, TODAYS_LOOK_OCCASION,
};
pub use state::{SessionEvent, SessionState, TransitionError};

//! Session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Token acquisition and query dispatch share one state so the gating rules
//! (no credential, no query; one request at a time) live in a single match.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Notice};
pub use event::Event;
pub use state::{AcquisitionState, SessionContext, SessionState, View};
pub use transition::{transition, TransitionError};

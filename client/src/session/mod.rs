//! Application session state.
//!
//! The single source of truth for the current user and generation history.
//! [`SessionState`] is the state machine, [`SessionController`] drives it
//! from identity-gateway events, and [`map_session`] translates provider
//! sessions into application users.

mod controller;
mod mapper;
mod state;

pub use controller::SessionController;
pub use mapper::{map_session, STARTING_CREDITS};
pub use state::{AuthPhase, SessionError, SessionState};

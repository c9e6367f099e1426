//! ContentFlow Common Types
//!
//! Shared types used by the client core and any rendering surface built on
//! top of it.

pub mod auth;
pub mod generation;
pub mod user;

pub use auth::{AuthEvent, Session, SessionUser};
pub use generation::{word_count, ContentType, GenerationHistory, Tone};
pub use user::{PlanTier, User};

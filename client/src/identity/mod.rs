//! Identity gateway client.
//!
//! Wraps the external identity provider behind the narrow contract the rest
//! of the client relies on: session probing, credential flows, and a
//! cancellable subscription for auth-state changes.

mod gateway;

pub use gateway::{
    AuthChange, AuthSubscription, IdentityError, IdentityGateway, MIN_PASSWORD_LENGTH,
};

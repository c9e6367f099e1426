//! Payment workflow client.
//!
//! Order creation and payment verification are delegated to an external
//! workflow webhook. Both calls require a bearer token from the identity
//! gateway's current session and fail closed before any request is sent
//! when no session exists.

mod n8n;

pub use n8n::{N8nClient, PaymentError, PaymentOrder, PaymentVerification};

/// Identifier of the paid plan offered at checkout.
pub const PRO_PLAN_ID: &str = "pro";

/// Monthly Pro price, in cents.
pub const PRO_PLAN_PRICE_CENTS: u64 = 2_900;

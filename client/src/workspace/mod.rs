//! Workspace generation driver and usage accounting.
//!
//! One generation request moves `Idle -> Submitting -> {Succeeded, Failed}`
//! and back to `Idle`. While a request is in flight a second submission is
//! rejected; a failed request surfaces an error and mutates nothing.

mod accountant;

pub use accountant::{apply_generation, can_generate, FREE_WORD_LIMIT, GENERATION_COST};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use contentflow_common::GenerationHistory;

use crate::generation::{GenerationProvider, GenerationRequest};
use crate::session::SessionState;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Topic must not be empty")]
    EmptyTopic,
    #[error("No signed-in user")]
    NotAuthenticated,
    #[error("Free plan word limit reached")]
    UsageLimitReached,
    #[error("A generation is already in progress")]
    RequestInFlight,
    /// Generic failure surfaced to the user; no structured provider error
    /// crosses this boundary.
    #[error("Failed to generate content. Please try again.")]
    GenerationFailed,
}

/// Drives generation requests against the provider and folds successful
/// results into session state.
pub struct Workspace {
    provider: Arc<dyn GenerationProvider>,
    session: Arc<RwLock<SessionState>>,
    in_flight: AtomicBool,
}

impl Workspace {
    pub fn new(provider: Arc<dyn GenerationProvider>, session: Arc<RwLock<SessionState>>) -> Self {
        Self {
            provider,
            session,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Submit one generation request.
    ///
    /// Validation happens before any network call: an empty topic, a
    /// missing user, or an exhausted free-plan allowance all reject the
    /// submission with no state change. On success the result is folded
    /// into user and history in a single transition and the new entry is
    /// returned.
    pub async fn submit(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationHistory, WorkspaceError> {
        if request.topic.trim().is_empty() {
            return Err(WorkspaceError::EmptyTopic);
        }
        {
            let state = self.session.read().await;
            let user = state.user().ok_or(WorkspaceError::NotAuthenticated)?;
            if !can_generate(user) {
                return Err(WorkspaceError::UsageLimitReached);
            }
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkspaceError::RequestInFlight);
        }

        let request_id = Uuid::new_v4();
        tracing::info!(
            request_id = %request_id,
            content_type = %request.content_type,
            "Generation started"
        );

        let result = self.provider.generate(request.clone()).await;
        let outcome = match result {
            Ok(content) => {
                let entry =
                    GenerationHistory::new(request.content_type, request.topic, content);
                let mut state = self.session.write().await;
                match state.record_generation(entry.clone()) {
                    Ok(()) => {
                        tracing::info!(request_id = %request_id, "Generation recorded");
                        Ok(entry)
                    }
                    // The user signed out while the request was in flight.
                    Err(_) => Err(WorkspaceError::NotAuthenticated),
                }
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, "Generation failed: {}", e);
                Err(WorkspaceError::GenerationFailed)
            }
        };

        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }
}

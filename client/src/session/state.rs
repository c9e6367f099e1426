use contentflow_common::{AuthEvent, GenerationHistory, Session, User};

use crate::session::map_session;
use crate::workspace::apply_generation;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No signed-in user")]
    NotAuthenticated,
}

/// Where the application currently stands with respect to authentication.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPhase {
    /// The initial session probe has not resolved yet.
    Loading,
    Anonymous,
    Authenticated(User),
}

/// The session state machine.
///
/// Starts in `Loading` and leaves it exactly once, either through the
/// initial session probe or through an auth event that arrives first.
/// Every transition bumps an epoch; a probe result issued at an older
/// epoch is discarded, so the most recent auth event always wins even
/// when an in-flight probe resolves late.
#[derive(Debug)]
pub struct SessionState {
    phase: AuthPhase,
    history: Vec<GenerationHistory>,
    epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: AuthPhase::Loading,
            history: Vec::new(),
            epoch: 0,
        }
    }

    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    pub fn user(&self) -> Option<&User> {
        match &self.phase {
            AuthPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Generation history, newest first.
    pub fn history(&self) -> &[GenerationHistory] {
        &self.history
    }

    /// Epoch to capture before issuing a session probe.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Apply a provider-driven auth event.
    ///
    /// `SignedOut` always clears the user. Any event carrying a session
    /// replaces the user wholesale. An event without a session only ends
    /// the loading phase, leaving an authenticated user in place.
    pub fn apply_event(&mut self, event: AuthEvent, session: Option<&Session>) {
        self.epoch += 1;
        match (event, session) {
            (AuthEvent::SignedOut, _) => {
                self.phase = AuthPhase::Anonymous;
            }
            (_, Some(session)) => {
                self.phase = AuthPhase::Authenticated(map_session(session));
            }
            (_, None) => {
                if self.phase == AuthPhase::Loading {
                    self.phase = AuthPhase::Anonymous;
                }
            }
        }
    }

    /// Resolve the initial session probe issued at `issued_epoch`.
    ///
    /// Returns false when the result is stale, i.e. an auth event has been
    /// applied since the probe was issued; the state is left untouched in
    /// that case.
    pub fn resolve_probe(&mut self, issued_epoch: u64, session: Option<&Session>) -> bool {
        if self.epoch != issued_epoch {
            return false;
        }
        self.epoch += 1;
        self.phase = match session {
            Some(session) => AuthPhase::Authenticated(map_session(session)),
            None => AuthPhase::Anonymous,
        };
        true
    }

    /// Fold a completed generation into user and history in one
    /// transition. History length and credits/usage never move separately.
    pub fn record_generation(&mut self, entry: GenerationHistory) -> Result<(), SessionError> {
        let AuthPhase::Authenticated(user) = &self.phase else {
            return Err(SessionError::NotAuthenticated);
        };
        let (updated, history) = apply_generation(user, &self.history, entry);
        self.phase = AuthPhase::Authenticated(updated);
        self.history = history;
        Ok(())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};
    use contentflow_common::{ContentType, SessionUser};

    fn session(id: &str, email: &str) -> Session {
        Session {
            user: SessionUser {
                id: id.to_string(),
                email: Some(email.to_string()),
            },
            access_token: "token".to_string(),
        }
    }

    fn entry(content: &str) -> GenerationHistory {
        GenerationHistory::new(
            ContentType::BlogPost,
            "remote work".to_string(),
            content.to_string(),
        )
    }

    #[test]
    fn test_starts_loading() {
        let state = SessionState::new();
        assert_eq!(*state.phase(), AuthPhase::Loading);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_probe_with_session_authenticates() {
        let mut state = SessionState::new();
        let epoch = state.epoch();
        assert!(state.resolve_probe(epoch, Some(&session("u-1", "alice@example.com"))));
        assert_eq!(state.user().unwrap().name, "alice");
    }

    #[test]
    fn test_probe_without_session_goes_anonymous() {
        let mut state = SessionState::new();
        let epoch = state.epoch();
        assert!(state.resolve_probe(epoch, None));
        assert_eq!(*state.phase(), AuthPhase::Anonymous);
    }

    #[test]
    fn test_stale_probe_is_discarded() {
        let mut state = SessionState::new();
        let epoch = state.epoch();

        // A sign-out lands before the probe resolves.
        state.apply_event(AuthEvent::SignedOut, None);
        assert!(!state.resolve_probe(epoch, Some(&session("u-1", "alice@example.com"))));

        // The newer event wins: no revert to the stale Authenticated.
        assert_eq!(*state.phase(), AuthPhase::Anonymous);
    }

    #[test]
    fn test_signed_out_clears_user() {
        let mut state = SessionState::new();
        state.apply_event(
            AuthEvent::SignedIn,
            Some(&session("u-1", "alice@example.com")),
        );
        state.apply_event(AuthEvent::SignedOut, None);
        assert_eq!(*state.phase(), AuthPhase::Anonymous);
    }

    #[test]
    fn test_new_session_fully_replaces_user() {
        let mut state = SessionState::new();
        state.apply_event(
            AuthEvent::SignedIn,
            Some(&session("u-1", "alice@example.com")),
        );
        assert_ok!(state.record_generation(entry("a b c")));
        assert_eq!(state.user().unwrap().usage_this_month, 3);

        // Provider re-emits a session: local accumulation is discarded.
        state.apply_event(
            AuthEvent::TokenRefreshed,
            Some(&session("u-1", "alice@example.com")),
        );
        assert_eq!(state.user().unwrap().usage_this_month, 0);
        assert_eq!(state.user().unwrap().credits, 500);
    }

    #[test]
    fn test_event_without_session_keeps_authenticated_user() {
        let mut state = SessionState::new();
        state.apply_event(
            AuthEvent::SignedIn,
            Some(&session("u-1", "alice@example.com")),
        );
        state.apply_event(AuthEvent::UserUpdated, None);
        assert!(state.user().is_some());
    }

    #[test]
    fn test_event_without_session_ends_loading() {
        let mut state = SessionState::new();
        state.apply_event(AuthEvent::TokenRefreshed, None);
        assert_eq!(*state.phase(), AuthPhase::Anonymous);
    }

    #[test]
    fn test_record_generation_updates_user_and_history_together() {
        let mut state = SessionState::new();
        state.apply_event(
            AuthEvent::SignedIn,
            Some(&session("u-1", "alice@example.com")),
        );

        assert_ok!(state.record_generation(entry("a b c d e")));

        let user = state.user().unwrap();
        assert_eq!(user.credits, 490);
        assert_eq!(user.usage_this_month, 5);
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_record_generation_prepends_newest_first() {
        let mut state = SessionState::new();
        state.apply_event(
            AuthEvent::SignedIn,
            Some(&session("u-1", "alice@example.com")),
        );

        assert_ok!(state.record_generation(entry("first")));
        let second = entry("second");
        let second_id = second.id.clone();
        assert_ok!(state.record_generation(second));

        assert_eq!(state.history()[0].id, second_id);
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_record_generation_requires_authentication() {
        let mut state = SessionState::new();
        assert_err!(state.record_generation(entry("a b c")));
        assert!(state.history().is_empty());
    }
}

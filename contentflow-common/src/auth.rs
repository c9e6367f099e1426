use serde::{Deserialize, Serialize};

/// The identity-provider principal carried inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Credential bundle issued by the identity provider for a signed-in
/// principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
}

/// Provider-driven auth-state transitions delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_event_wire_format() {
        assert_eq!(
            serde_json::to_value(AuthEvent::SignedOut).unwrap(),
            "SIGNED_OUT"
        );
        assert_eq!(
            serde_json::to_value(AuthEvent::TokenRefreshed).unwrap(),
            "TOKEN_REFRESHED"
        );
    }

    #[test]
    fn test_session_deserializes_without_email() {
        let session: Session = serde_json::from_str(
            r#"{"user":{"id":"u-1"},"access_token":"tok"}"#,
        )
        .unwrap();
        assert_eq!(session.user.id, "u-1");
        assert!(session.user.email.is_none());
    }
}

use contentflow_common::{PlanTier, Session, User};

/// Credit allotment granted to every freshly mapped session.
pub const STARTING_CREDITS: i64 = 500;

/// Translate a provider session into the application's user.
///
/// Pure and deterministic. Plan, credits and usage are fixed defaults: the
/// provider carries no plan information, so any locally accumulated
/// credits/usage are discarded whenever the provider re-emits a session.
pub fn map_session(session: &Session) -> User {
    let email = session.user.email.clone().unwrap_or_default();
    let name = email
        .split('@')
        .next()
        .filter(|local_part| !local_part.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "User".to_string());

    User {
        id: session.user.id.clone(),
        name,
        email,
        plan: PlanTier::Free,
        credits: STARTING_CREDITS,
        usage_this_month: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentflow_common::SessionUser;
    use rstest::rstest;

    fn session(email: Option<&str>) -> Session {
        Session {
            user: SessionUser {
                id: "user-1".to_string(),
                email: email.map(String::from),
            },
            access_token: "token".to_string(),
        }
    }

    #[rstest]
    #[case("alice@example.com", "alice")]
    #[case("bob.smith@company.io", "bob.smith")]
    #[case("carol@multi@at.com", "carol")]
    fn test_name_is_email_local_part(#[case] email: &str, #[case] expected: &str) {
        let user = map_session(&session(Some(email)));
        assert_eq!(user.name, expected);
        assert_eq!(user.email, email);
    }

    #[test]
    fn test_absent_email_falls_back_to_user() {
        let user = map_session(&session(None));
        assert_eq!(user.name, "User");
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_empty_local_part_falls_back_to_user() {
        let user = map_session(&session(Some("@example.com")));
        assert_eq!(user.name, "User");
    }

    #[test]
    fn test_defaults_regardless_of_session_contents() {
        for email in [Some("alice@example.com"), None] {
            let user = map_session(&session(email));
            assert_eq!(user.plan, PlanTier::Free);
            assert_eq!(user.credits, 500);
            assert_eq!(user.usage_this_month, 0);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let session = session(Some("alice@example.com"));
        assert_eq!(map_session(&session), map_session(&session));
    }
}

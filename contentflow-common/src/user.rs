use serde::{Deserialize, Serialize};

/// Subscription level governing usage limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlanTier::Free => "Free",
            PlanTier::Pro => "Pro",
            PlanTier::Enterprise => "Enterprise",
        };
        write!(f, "{}", label)
    }
}

/// The signed-in principal as the application sees it.
///
/// Owned exclusively by the session state; everything else receives a
/// read-only view. Replaced wholesale on every auth-state change, never
/// partially mutated by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque stable identifier from the identity provider.
    pub id: String,
    /// Display name, derived from the email local-part when no profile
    /// name exists.
    pub name: String,
    pub email: String,
    pub plan: PlanTier,
    /// Remaining generation credits. May go negative; no floor is enforced.
    pub credits: i64,
    /// Word count accumulated this month. In-memory only; reset by process
    /// restart or a provider-driven session refresh.
    pub usage_this_month: u64,
}

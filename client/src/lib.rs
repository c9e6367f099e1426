pub mod config;
pub mod generation;
pub mod identity;
pub mod payments;
pub mod router;
pub mod session;
pub mod workspace;

pub use config::Config;
pub use generation::{GeminiClient, GenerationError, GenerationProvider, GenerationRequest};
pub use identity::{AuthChange, AuthSubscription, IdentityError, IdentityGateway};
pub use payments::{N8nClient, PaymentError, PaymentOrder, PaymentVerification};
pub use router::{decide, Route, RouteDecision};
pub use session::{map_session, AuthPhase, SessionController, SessionState};
pub use workspace::{
    apply_generation, can_generate, Workspace, WorkspaceError, FREE_WORD_LIMIT, GENERATION_COST,
};

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

/// Wired application core.
///
/// Owns the external-provider clients and the shared session state. The
/// rendering surface reads `phase` and `session` and requests mutations
/// through `workspace`, `payments`, and `logout`; the returned
/// [`SessionController`] must be spawned for the state to track the
/// identity provider.
pub struct App {
    pub config: Config,
    pub identity: Arc<IdentityGateway>,
    pub session: Arc<RwLock<SessionState>>,
    pub phase: watch::Receiver<AuthPhase>,
    pub workspace: Workspace,
    pub payments: N8nClient,
}

impl App {
    pub fn new(config: Config) -> (Self, SessionController) {
        let mut identity =
            IdentityGateway::new(&config.identity.base_url, &config.identity.anon_key);
        if let Some(site_url) = &config.identity.site_url {
            identity = identity.with_site_url(site_url);
        }
        let identity = Arc::new(identity);

        let (controller, phase) = SessionController::new(identity.clone());
        let session = controller.state();

        let provider: Arc<dyn GenerationProvider> = Arc::new(GeminiClient::new(
            &config.generation.base_url,
            &config.generation.api_key,
            &config.generation.model,
        ));
        let workspace = Workspace::new(provider, session.clone());
        let payments = N8nClient::new(&config.payments.webhook_base, identity.clone());

        (
            Self {
                config,
                identity,
                session,
                phase,
                workspace,
                payments,
            },
            controller,
        )
    }

    /// Request session termination; the session state follows through the
    /// gateway's `SignedOut` notification.
    pub async fn logout(&self) -> Result<(), IdentityError> {
        self.identity.sign_out().await
    }
}

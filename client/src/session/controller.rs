use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::identity::IdentityGateway;
use crate::session::{AuthPhase, SessionState};

/// Drives the session state machine from identity-gateway events.
///
/// The controller is the only writer of session state. It registers its
/// subscription before issuing the initial session probe, so no provider
/// event can be missed during bootstrap; a probe that resolves after a
/// newer event has landed is discarded by the state machine's epoch guard.
pub struct SessionController {
    gateway: Arc<IdentityGateway>,
    state: Arc<RwLock<SessionState>>,
    phase_tx: watch::Sender<AuthPhase>,
}

impl SessionController {
    /// Create a controller and the channel on which observers watch the
    /// auth phase.
    pub fn new(gateway: Arc<IdentityGateway>) -> (Self, watch::Receiver<AuthPhase>) {
        let (phase_tx, phase_rx) = watch::channel(AuthPhase::Loading);
        let controller = Self {
            gateway,
            state: Arc::new(RwLock::new(SessionState::new())),
            phase_tx,
        };
        (controller, phase_rx)
    }

    /// Shared handle to the session state for readers and the workspace
    /// fold.
    pub fn state(&self) -> Arc<RwLock<SessionState>> {
        self.state.clone()
    }

    /// Run the bootstrap probe and then the event loop until the gateway
    /// goes away.
    pub async fn run(self) {
        // Subscribe first: an event arriving mid-probe must not be lost.
        let mut subscription = self.gateway.subscribe();

        let probe_epoch = { self.state.read().await.epoch() };
        let probed = match self.gateway.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Session probe failed: {}", e);
                None
            }
        };
        {
            let mut state = self.state.write().await;
            if state.resolve_probe(probe_epoch, probed.as_ref()) {
                tracing::info!(phase = discriminant_name(state.phase()), "Session bootstrap complete");
            } else {
                tracing::debug!("Discarded stale session probe result");
            }
            self.phase_tx.send_replace(state.phase().clone());
        }

        while let Some(change) = subscription.recv().await {
            let mut state = self.state.write().await;
            tracing::info!(event = ?change.event, "Auth state change");
            state.apply_event(change.event, change.session.as_ref());
            self.phase_tx.send_replace(state.phase().clone());
        }

        subscription.unsubscribe();
        tracing::debug!("Identity gateway closed, session controller stopping");
    }
}

fn discriminant_name(phase: &AuthPhase) -> &'static str {
    match phase {
        AuthPhase::Loading => "loading",
        AuthPhase::Anonymous => "anonymous",
        AuthPhase::Authenticated(_) => "authenticated",
    }
}

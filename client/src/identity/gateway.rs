use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};

use contentflow_common::{AuthEvent, Session, SessionUser};

/// Minimum accepted password length, enforced before any network call.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity request failed: {0}")]
    Transport(String),
    /// Provider-reported failure, message surfaced verbatim.
    #[error("{0}")]
    Provider(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("No active session")]
    SessionRequired,
    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,
}

/// One auth-state change delivered to subscribers.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

type SubscriberMap = Mutex<HashMap<u64, mpsc::UnboundedSender<AuthChange>>>;

fn lock_subscribers(map: &SubscriberMap) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<AuthChange>>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Capability to receive auth-state changes, cancelled on teardown.
///
/// Callers release the registration exactly once via [`unsubscribe`];
/// dropping the handle releases it as well so a missed teardown cannot
/// leak a listener.
///
/// [`unsubscribe`]: AuthSubscription::unsubscribe
pub struct AuthSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<AuthChange>,
    registry: Arc<SubscriberMap>,
    released: bool,
}

impl AuthSubscription {
    /// Wait for the next auth-state change. Returns `None` once the
    /// gateway has gone away.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        self.rx.recv().await
    }

    /// Cancel the registration.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            lock_subscribers(&self.registry).remove(&self.id);
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    refresh_token: Option<String>,
}

/// Client for the external identity provider.
///
/// Holds the current session and a registry of auth-change subscribers.
/// Every successful credential flow stores the new session first, then
/// notifies subscribers, so a listener that reacts to an event always
/// observes the session that caused it.
pub struct IdentityGateway {
    http: Client,
    base_url: String,
    anon_key: String,
    /// Where email links (magic link, password reset) send the user back to.
    site_url: Option<String>,
    store: RwLock<Option<StoredSession>>,
    subscribers: Arc<SubscriberMap>,
    next_subscription_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: SessionUser,
}

/// Sign-up may answer with a full session (auto-confirm) or a bare user
/// record when email confirmation is still pending.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<SessionUser>,
}

impl IdentityGateway {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            site_url: None,
            store: RwLock::new(None),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscription_id: AtomicU64::new(0),
        }
    }

    /// Set the application origin used as the redirect target of email
    /// links.
    pub fn with_site_url(mut self, site_url: &str) -> Self {
        self.site_url = Some(site_url.trim_end_matches('/').to_string());
        self
    }

    /// Register a standing listener for auth-state changes.
    pub fn subscribe(&self) -> AuthSubscription {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        lock_subscribers(&self.subscribers).insert(id, tx);
        AuthSubscription {
            id,
            rx,
            registry: self.subscribers.clone(),
            released: false,
        }
    }

    /// Bearer token of the current session, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.store
            .read()
            .await
            .as_ref()
            .map(|stored| stored.session.access_token.clone())
    }

    /// Probe the provider for an existing session.
    ///
    /// An absent session is `Ok(None)`; only transport failure is an error.
    /// A session the provider no longer accepts is discarded and reported
    /// as absent.
    pub async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        let stored = { self.store.read().await.clone() };
        let Some(stored) = stored else {
            return Ok(None);
        };

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&stored.session.access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            tracing::info!("Stored session rejected by provider, discarding");
            self.store.write().await.take();
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let user: SessionUser = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        let session = Session {
            user,
            access_token: stored.session.access_token,
        };
        if let Some(current) = self.store.write().await.as_mut() {
            current.session = session.clone();
        }
        Ok(Some(session))
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        tracing::info!(user_id = %token.user.id, "Signed in with password");
        self.install_session(
            Session {
                user: token.user,
                access_token: token.access_token,
            },
            token.refresh_token,
            AuthEvent::SignedIn,
        )
        .await;
        Ok(())
    }

    /// Create a new account. When the provider auto-confirms, the returned
    /// session is installed and `SignedIn` is emitted; otherwise the caller
    /// is expected to tell the user to check their email.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let signup: SignUpResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        if let (Some(access_token), Some(user)) = (signup.access_token, signup.user) {
            tracing::info!(user_id = %user.id, "Signed up with immediate session");
            self.install_session(
                Session { user, access_token },
                signup.refresh_token,
                AuthEvent::SignedIn,
            )
            .await;
        } else {
            tracing::info!("Sign-up accepted, confirmation pending");
        }
        Ok(())
    }

    /// Request a passwordless magic-link email.
    pub async fn sign_in_with_magic_link(&self, email: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/otp", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&OtpRequest {
                email,
                create_user: true,
            });
        if let Some(site_url) = &self.site_url {
            request = request.query(&[("redirect_to", site_url.as_str())]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }
        tracing::info!("Magic link requested");
        Ok(())
    }

    /// Request a password-reset email. The link completes at the
    /// update-password path.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/recover", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&RecoverRequest { email });
        if let Some(site_url) = &self.site_url {
            let redirect = format!("{}/update-password", site_url);
            request = request.query(&[("redirect_to", redirect.as_str())]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }
        tracing::info!("Password reset requested");
        Ok(())
    }

    /// Finalize a password change for the signed-in principal.
    pub async fn update_password(&self, new_password: &str) -> Result<(), IdentityError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::PasswordTooShort);
        }
        let stored = { self.store.read().await.clone() };
        let Some(stored) = stored else {
            return Err(IdentityError::SessionRequired);
        };

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .put(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&stored.session.access_token)
            .json(&PasswordUpdate {
                password: new_password,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let user: SessionUser = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        let session = Session {
            user,
            access_token: stored.session.access_token,
        };
        tracing::info!(user_id = %session.user.id, "Password updated");
        self.install_session(session, stored.refresh_token, AuthEvent::UserUpdated)
            .await;
        Ok(())
    }

    /// Exchange the stored refresh token for a fresh session.
    pub async fn refresh_session(&self) -> Result<(), IdentityError> {
        let stored = { self.store.read().await.clone() };
        let refresh_token = stored
            .and_then(|s| s.refresh_token)
            .ok_or(IdentityError::SessionRequired)?;

        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        tracing::debug!("Session token refreshed");
        self.install_session(
            Session {
                user: token.user,
                access_token: token.access_token,
            },
            token.refresh_token,
            AuthEvent::TokenRefreshed,
        )
        .await;
        Ok(())
    }

    /// Terminate the current session. Subscribers observe `SignedOut`
    /// after the provider accepts the request. A missing session is a
    /// no-op.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let stored = { self.store.read().await.clone() };
        let Some(stored) = stored else {
            return Ok(());
        };

        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&stored.session.access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        // 401 means the token is already dead; either way the session is over.
        if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
            return Err(provider_error(response).await);
        }

        self.store.write().await.take();
        tracing::info!("Signed out");
        self.notify(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn install_session(
        &self,
        session: Session,
        refresh_token: Option<String>,
        event: AuthEvent,
    ) {
        *self.store.write().await = Some(StoredSession {
            session: session.clone(),
            refresh_token,
        });
        self.notify(event, Some(session));
    }

    fn notify(&self, event: AuthEvent, session: Option<Session>) {
        let subscribers = lock_subscribers(&self.subscribers);
        for (id, tx) in subscribers.iter() {
            if tx
                .send(AuthChange {
                    event,
                    session: session.clone(),
                })
                .is_err()
            {
                tracing::debug!("Auth subscriber {} is gone", id);
            }
        }
    }
}

fn provider_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| {
                    value
                        .get(*key)
                        .and_then(|message| message.as_str())
                        .map(str::to_string)
                })
        })
        .unwrap_or_else(|| format!("{}: {}", status, body))
}

async fn provider_error(response: reqwest::Response) -> IdentityError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    IdentityError::Provider(provider_message(status, &body))
}

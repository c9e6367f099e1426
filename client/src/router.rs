//! Route guard.
//!
//! Pure decision function over (auth phase, requested path). The guard
//! never performs navigation itself; it tells the rendering surface what
//! to do and the surface carries it out.

use crate::session::AuthPhase;

/// The application's navigable routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Auth,
    ForgotPassword,
    /// Completion step of the password-reset flow; reachable without a
    /// fully established session.
    UpdatePassword,
    Dashboard,
    Workspace,
    Billing,
    Settings,
}

impl Route {
    /// Parse a request path, ignoring query string and fragment.
    pub fn parse(path: &str) -> Option<Self> {
        let path = match path.find(&['?', '#'][..]) {
            Some(index) => &path[..index],
            None => path,
        };
        match path {
            "/" => Some(Route::Landing),
            "/auth" => Some(Route::Auth),
            "/forgot-password" => Some(Route::ForgotPassword),
            "/update-password" => Some(Route::UpdatePassword),
            "/dashboard" => Some(Route::Dashboard),
            "/workspace" => Some(Route::Workspace),
            "/billing" => Some(Route::Billing),
            "/settings" => Some(Route::Settings),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Auth => "/auth",
            Route::ForgotPassword => "/forgot-password",
            Route::UpdatePassword => "/update-password",
            Route::Dashboard => "/dashboard",
            Route::Workspace => "/workspace",
            Route::Billing => "/billing",
            Route::Settings => "/settings",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Workspace | Route::Billing | Route::Settings
        )
    }
}

/// What the rendering surface should do with a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    Render(Route),
    Redirect {
        to: Route,
        /// Originally requested path, remembered for post-login return.
        remember: Option<String>,
    },
    /// Initial session probe still pending: show a neutral waiting
    /// indicator, decide nothing.
    Wait,
}

/// Decide how to handle a navigation to `path` in the given auth phase.
pub fn decide(phase: &AuthPhase, path: &str) -> RouteDecision {
    if *phase == AuthPhase::Loading {
        return RouteDecision::Wait;
    }

    let Some(route) = Route::parse(path) else {
        return RouteDecision::Redirect {
            to: Route::Landing,
            remember: None,
        };
    };

    let authenticated = matches!(phase, AuthPhase::Authenticated(_));
    match route {
        Route::UpdatePassword => RouteDecision::Render(route),
        protected if protected.requires_auth() => {
            if authenticated {
                RouteDecision::Render(route)
            } else {
                RouteDecision::Redirect {
                    to: Route::Auth,
                    remember: Some(path.to_string()),
                }
            }
        }
        public => {
            if authenticated {
                RouteDecision::Redirect {
                    to: Route::Dashboard,
                    remember: None,
                }
            } else {
                RouteDecision::Render(public)
            }
        }
    }
}

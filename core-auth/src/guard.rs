//! Route Guard
//!
//! Pure routing decision derived from the current auth state. Hosts call
//! [`RouteGuard::evaluate`] before rendering a protected view and act on the
//! returned [`RouteDecision`].

use crate::types::{AuthState, Session};

/// Route to the login view.
pub const ROUTE_LOGIN: &str = "/login";
/// Route to the email verification prompt.
pub const ROUTE_VERIFY_EMAIL: &str = "/verify-email";
/// Route to the drive home view.
pub const ROUTE_HOME: &str = "/home";

/// What the host should render for a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Startup validation still in progress; show a loading indicator
    Loading,
    /// No session; redirect to the login view
    RedirectToLogin,
    /// Session exists but the email is unverified; redirect to the
    /// verification prompt, carrying the email so it can be re-sent
    RedirectToVerifyEmail { email: String },
    /// Render the protected content
    Allow,
}

/// Pure function of manager state; holds no state of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteGuard;

impl RouteGuard {
    /// Decide what to render for a protected route.
    ///
    /// `session` is the manager's current session and is only consulted for
    /// the unverified-email redirect.
    pub fn evaluate(state: AuthState, session: Option<&Session>) -> RouteDecision {
        match state {
            AuthState::Authenticating => RouteDecision::Loading,
            AuthState::Unauthenticated => RouteDecision::RedirectToLogin,
            AuthState::Authenticated { email_verified } => {
                if email_verified {
                    RouteDecision::Allow
                } else {
                    let email = session
                        .map(|s| s.user.email.clone())
                        .unwrap_or_default();
                    RouteDecision::RedirectToVerifyEmail { email }
                }
            }
        }
    }
}

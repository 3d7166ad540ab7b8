use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh token pair issued by the identity backend.
///
/// # Security
///
/// Tokens should be stored securely and never logged. The `Debug`
/// implementation redacts token values.
///
/// # Examples
///
/// ```
/// use core_auth::TokenPair;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let tokens = TokenPair {
///     access_token: "eyJhb...".to_string(),
///     refresh_token: "d4f8...".to_string(),
///     expires_at: now + Duration::hours(1),
/// };
///
/// assert!(!tokens.is_expired_with_buffer(now, 60));
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: String,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl TokenPair {
    /// Create a new token pair expiring `expires_in` seconds after `now`.
    pub fn new(
        access_token: String,
        refresh_token: String,
        now: DateTime<Utc>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    /// Check if the access token is expired or will expire within the buffer.
    ///
    /// The buffer period ensures a refresh fires before the token actually
    /// expires. `now` is passed in so the check is deterministic under an
    /// injected [`Clock`](bridge_traits::Clock).
    pub fn is_expired_with_buffer(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        now >= self.expires_at - Duration::seconds(buffer_seconds)
    }

    /// Get the time remaining until token expiration.
    ///
    /// Returns `None` if the token is already expired.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Cached user identity fields.
///
/// These are the non-secret fields persisted alongside the tokens so the
/// host can render the account header without a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    /// Full display name, `"First Last"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An authenticated session held by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The current token pair
    pub tokens: TokenPair,
    /// Cached user fields
    pub user: UserProfile,
    /// Whether the account's email address is verified
    pub email_verified: bool,
}

/// Authentication state exposed to hosts.
///
/// # State Transitions
///
/// ```text
/// Authenticating -> Unauthenticated
///        |
///        v
///  Authenticated <-> (token refresh, state unchanged)
///        |
///        v
///  Unauthenticated (logout or refresh failure)
/// ```
///
/// Startup begins in `Authenticating` while stored tokens are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    /// No valid session
    Unauthenticated,
    /// Startup validation or a login attempt is in progress
    Authenticating,
    /// A valid session is held
    Authenticated {
        /// Whether the account's email address is verified
        email_verified: bool,
    },
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Authenticating
    }
}

impl AuthState {
    /// Check if the user holds a valid session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Check if startup validation or login is still in progress.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuthState::Authenticating)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "Unauthenticated"),
            AuthState::Authenticating => write!(f, "Authenticating..."),
            AuthState::Authenticated { email_verified } => {
                if *email_verified {
                    write!(f, "Authenticated")
                } else {
                    write!(f, "Authenticated (unverified)")
                }
            }
        }
    }
}

//! # Core Auth
//!
//! Authentication session lifecycle for the drive client: identity API
//! access, secure token persistence, proactive renewal, and the route guard
//! hosts consult before rendering protected views.
//!
//! ## Architecture
//!
//! - [`IdentityClient`] — typed client for the identity HTTP API
//! - [`SessionStore`] — persists tokens and profile fields through the
//!   platform stores
//! - [`RenewalTimer`] — one-shot cancellable timer for token renewal
//! - [`SessionManager`] — orchestrates the lifecycle and emits auth events
//! - [`RouteGuard`] — pure routing decision from the current [`AuthState`]

pub mod api;
pub mod error;
pub mod guard;
pub mod manager;
pub mod renewal;
pub mod session_store;
pub mod types;

pub use api::{
    ApiFailure, ErrorCode, IdentityClient, LoginResponse, RefreshResponse, RegisterPayload,
    TotpSetupResponse, ValidateTokenResponse,
};
pub use error::{AuthError, Result};
pub use guard::{RouteDecision, RouteGuard, ROUTE_HOME, ROUTE_LOGIN, ROUTE_VERIFY_EMAIL};
pub use manager::SessionManager;
pub use renewal::RenewalTimer;
pub use session_store::{
    SessionStore, StoredSession, KEY_ACCESS_TOKEN, KEY_EMAIL, KEY_FIRST_NAME, KEY_LAST_NAME,
    KEY_REFRESH_TOKEN,
};
pub use types::{AuthState, Session, TokenPair, UserProfile};

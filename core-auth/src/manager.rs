//! # Session Manager
//!
//! Orchestrates the authentication session lifecycle: startup validation,
//! login, logout, and proactive token renewal.
//!
//! ## Overview
//!
//! The `SessionManager` owns the current [`Session`] and exposes the
//! [`AuthState`] hosts render from. It persists the session through
//! [`SessionStore`], talks to the backend through [`IdentityClient`], and
//! emits [`AuthEvent`]s to the application's event bus.
//!
//! ## Renewal
//!
//! After entering `Authenticated`, a one-shot [`RenewalTimer`] is armed at
//! `expires_at - now - renewal_lead`, floored at zero. Arming replaces any
//! pending timer, so exactly one renewal is ever scheduled per session.
//! The refresh sequence itself runs under a single in-flight guard; a timer
//! fire and a manual refresh cannot race. Refresh failure of any kind clears
//! the session and the stored keys and emits `SessionExpired`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::{IdentityClient, SessionManager, SessionStore};
//! use core_runtime::events::EventBus;
//!
//! let manager = SessionManager::new(client, store, event_bus, clock, renewal_lead);
//! manager.initialize().await?;
//!
//! let session = manager.login("ada@example.com", "password").await?;
//! ```

use crate::api::{ErrorCode, IdentityClient, ValidateTokenResponse};
use crate::error::{AuthError, Result};
use crate::renewal::RenewalTimer;
use crate::session_store::SessionStore;
use crate::types::{AuthState, Session, TokenPair, UserProfile};
use bridge_traits::Clock;
use chrono::{DateTime, TimeZone, Utc};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

struct ManagerState {
    state: AuthState,
    session: Option<Session>,
}

/// Orchestrates the authentication session lifecycle.
///
/// Cheap to clone; all state is shared behind `Arc`.
#[derive(Clone)]
pub struct SessionManager {
    client: IdentityClient,
    store: SessionStore,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    renewal_lead: Duration,
    state: Arc<RwLock<ManagerState>>,
    timer: Arc<RenewalTimer>,
    /// Single in-flight guard for the refresh sequence
    refresh_guard: Arc<Mutex<()>>,
    /// Bumped on login/logout/shutdown; a stale refresh discards its result
    generation: Arc<AtomicU64>,
}

impl SessionManager {
    /// Creates a new session manager.
    ///
    /// The manager starts in [`AuthState::Authenticating`]; call
    /// [`initialize`](Self::initialize) to settle the startup state.
    pub fn new(
        client: IdentityClient,
        store: SessionStore,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
        renewal_lead: Duration,
    ) -> Self {
        Self {
            client,
            store,
            event_bus,
            clock,
            renewal_lead,
            state: Arc::new(RwLock::new(ManagerState {
                state: AuthState::Authenticating,
                session: None,
            })),
            timer: Arc::new(RenewalTimer::new()),
            refresh_guard: Arc::new(Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Settle the startup state from persisted credentials.
    ///
    /// - No stored access token: `Unauthenticated`.
    /// - Stored token validates: `Authenticated` with the backend's verified
    ///   flag, renewal scheduled.
    /// - Validation fails but a refresh token is stored: refresh, persist the
    ///   new pair, re-validate.
    /// - Any failure along the way clears all stored keys and settles on
    ///   `Unauthenticated`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No stored session");
                self.settle_unauthenticated().await;
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored session");
                self.settle_unauthenticated().await;
                return Ok(());
            }
        };

        info!("Found stored session, validating");

        match self.client.validate_token(&stored.tokens.access_token).await {
            Ok(validated) => {
                self.enter_authenticated(stored.tokens, validated).await?;
                return Ok(());
            }
            Err(e) => {
                debug!(error = %e, "Stored token rejected, attempting refresh");
            }
        }

        // Validation failed; try the stored refresh token once.
        match self.refresh_with_token(&stored.tokens.refresh_token).await {
            Ok(tokens) => match self.client.validate_token(&tokens.access_token).await {
                Ok(validated) => {
                    self.enter_authenticated(tokens, validated).await?;
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Re-validation after refresh failed, clearing session");
                    self.clear_and_settle().await;
                    Ok(())
                }
            },
            Err(e) => {
                info!(error = %e, "Stored session could not be refreshed, clearing");
                self.clear_and_settle().await;
                Ok(())
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the session is persisted, `SignedIn` is emitted, and
    /// renewal is scheduled. An unverified account yields
    /// [`AuthError::EmailNotVerified`] and never enters a verified state.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        {
            let mut guard = self.state.write().await;
            guard.state = AuthState::Authenticating;
        }

        let event = CoreEvent::Auth(AuthEvent::SigningIn {
            email: email.to_string(),
        });
        let _ = self.event_bus.emit(event);

        let response = match self.client.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                self.settle_unauthenticated().await;

                let mapped = match &e {
                    AuthError::Api {
                        code: Some(code), ..
                    } if ErrorCode::parse(code) == ErrorCode::EmailNotVerified => {
                        AuthError::EmailNotVerified {
                            email: email.to_string(),
                        }
                    }
                    _ => e,
                };

                let event = CoreEvent::Auth(AuthEvent::AuthError {
                    message: mapped.to_string(),
                    code: match &mapped {
                        AuthError::Api { code, .. } => code.clone(),
                        AuthError::EmailNotVerified { .. } => {
                            Some(ErrorCode::EmailNotVerified.as_str().to_string())
                        }
                        _ => None,
                    },
                    recoverable: true,
                });
                let _ = self.event_bus.emit(event);

                return Err(mapped);
            }
        };

        let now = self.clock.now();
        let tokens = TokenPair::new(
            response.access_token,
            response.refresh_token,
            now,
            response.expires_in,
        );
        let user = UserProfile {
            email: response.email,
            first_name: response.first_name,
            last_name: response.last_name,
        };

        if let Err(e) = self.store.save(&tokens, &user).await {
            // Never leave the manager in Authenticating over a dead store.
            warn!(error = %e, "Failed to persist session after login");
            self.clear_and_settle().await;
            return Err(e);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        let session = Session {
            tokens: tokens.clone(),
            user,
            email_verified: response.email_verified,
        };

        {
            let mut guard = self.state.write().await;
            guard.state = AuthState::Authenticated {
                email_verified: response.email_verified,
            };
            guard.session = Some(session.clone());
        }

        let event = CoreEvent::Auth(AuthEvent::SignedIn {
            email: session.user.email.clone(),
            email_verified: session.email_verified,
        });
        let _ = self.event_bus.emit(event);

        self.schedule_renewal(tokens.expires_at).await;

        info!(email_verified = session.email_verified, "Login completed");
        Ok(session)
    }

    /// Sign out.
    ///
    /// Remote sign-out is best-effort; the stored keys are always cleared,
    /// the pending renewal is cancelled, and `SignedOut` is emitted.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let access_token = {
            let guard = self.state.read().await;
            guard
                .session
                .as_ref()
                .map(|s| s.tokens.access_token.clone())
        };

        if let Some(token) = access_token {
            if let Err(e) = self.client.logout(&token).await {
                warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
            }
        }

        self.timer.cancel().await;
        self.generation.fetch_add(1, Ordering::SeqCst);

        {
            let mut guard = self.state.write().await;
            guard.state = AuthState::Unauthenticated;
            guard.session = None;
        }

        let clear_result = self.store.clear().await;

        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedOut));
        info!("Logout completed");

        clear_result
    }

    /// The current session, if authenticated.
    pub async fn current_session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    /// The current auth state.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.state
    }

    /// Ask the backend to re-send the verification email.
    pub async fn send_verification_email(&self, email: &str) -> Result<()> {
        self.client.send_verification_email(email).await
    }

    /// Run the refresh sequence now.
    ///
    /// Serialized by the in-flight guard; a scheduled renewal and a manual
    /// call cannot race. Success rotates the stored pair and re-arms the
    /// timer; any failure clears the session and emits `SessionExpired`.
    ///
    /// Returns a boxed future: the renewal callback awaits this method and
    /// re-arms the timer on success, so the future type must be erased to
    /// stay finite.
    pub fn refresh_session(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.refresh_session_inner())
    }

    #[instrument(name = "refresh_session", skip(self))]
    async fn refresh_session_inner(&self) -> Result<()> {
        let _guard = self.refresh_guard.lock().await;
        let generation = self.generation.load(Ordering::SeqCst);

        let refresh_token = {
            let guard = self.state.read().await;
            match guard.session.as_ref() {
                Some(session) => session.tokens.refresh_token.clone(),
                None => return Err(AuthError::NotAuthenticated),
            }
        };

        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshing));

        match self.refresh_with_token(&refresh_token).await {
            Ok(tokens) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    debug!("Session changed during refresh, discarding result");
                    return Ok(());
                }

                if let Err(e) = self.store.save_tokens(&tokens).await {
                    warn!(error = %e, "Failed to persist rotated tokens, ending session");
                    self.timer.cancel().await;
                    self.clear_and_settle().await;
                    let event = CoreEvent::Auth(AuthEvent::SessionExpired {
                        reason: e.to_string(),
                    });
                    let _ = self.event_bus.emit(event);
                    return Err(e);
                }

                {
                    let mut guard = self.state.write().await;
                    if let Some(session) = guard.session.as_mut() {
                        session.tokens = tokens.clone();
                    }
                }

                let event = CoreEvent::Auth(AuthEvent::TokenRefreshed {
                    expires_at: tokens.expires_at.timestamp(),
                });
                let _ = self.event_bus.emit(event);

                self.schedule_renewal(tokens.expires_at).await;
                info!("Token refreshed");
                Ok(())
            }
            Err(e) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    debug!("Session changed during refresh, discarding failure");
                    return Ok(());
                }

                warn!(error = %e, "Refresh failed, ending session");
                self.timer.cancel().await;
                self.clear_and_settle().await;

                let event = CoreEvent::Auth(AuthEvent::SessionExpired {
                    reason: e.to_string(),
                });
                let _ = self.event_bus.emit(event);

                Err(e)
            }
        }
    }

    /// Cancel the pending renewal.
    ///
    /// In-flight requests are not interrupted; their results are discarded
    /// because the session generation no longer matches.
    pub async fn shutdown(&self) {
        self.timer.cancel().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("Session manager shut down");
    }

    /// Whether a renewal timer is currently armed. Test hook.
    pub async fn renewal_armed(&self) -> bool {
        self.timer.is_armed().await
    }

    async fn refresh_with_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let response = self.client.refresh(refresh_token).await?;
        let now = self.clock.now();
        Ok(TokenPair::new(
            response.access_token,
            response.refresh_token,
            now,
            response.expires_in,
        ))
    }

    async fn enter_authenticated(
        &self,
        tokens: TokenPair,
        validated: ValidateTokenResponse,
    ) -> Result<()> {
        let expires_at = Utc
            .timestamp_opt(validated.expires_at, 0)
            .single()
            .unwrap_or(tokens.expires_at);

        let tokens = TokenPair {
            expires_at,
            ..tokens
        };
        let user = UserProfile {
            email: validated.email,
            first_name: validated.first_name,
            last_name: validated.last_name,
        };

        // Backend is authoritative for expiry and user fields.
        if let Err(e) = self.store.save(&tokens, &user).await {
            warn!(error = %e, "Failed to persist validated session");
            self.clear_and_settle().await;
            return Err(e);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        let session = Session {
            tokens: tokens.clone(),
            user,
            email_verified: validated.email_verified,
        };

        {
            let mut guard = self.state.write().await;
            guard.state = AuthState::Authenticated {
                email_verified: validated.email_verified,
            };
            guard.session = Some(session.clone());
        }

        self.schedule_renewal(tokens.expires_at).await;

        info!(
            email_verified = session.email_verified,
            "Session established"
        );
        Ok(())
    }

    /// Arm the renewal timer at `expires_at - now - renewal_lead`, floored
    /// at zero.
    async fn schedule_renewal(&self, expires_at: DateTime<Utc>) {
        let now = self.clock.now();
        let lead = chrono::Duration::from_std(self.renewal_lead)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        let delay = (expires_at - now - lead)
            .to_std()
            .unwrap_or(Duration::ZERO);

        debug!(delay_secs = delay.as_secs(), "Scheduling token renewal");

        let manager = self.clone();
        self.timer
            .schedule(delay, move || -> BoxFuture<'static, ()> {
                Box::pin(async move {
                    if let Err(e) = manager.refresh_session().await {
                        debug!(error = %e, "Scheduled renewal did not complete");
                    }
                })
            })
            .await;
    }

    async fn settle_unauthenticated(&self) {
        let mut guard = self.state.write().await;
        guard.state = AuthState::Unauthenticated;
        guard.session = None;
    }

    async fn clear_and_settle(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.settle_unauthenticated().await;
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client", &self.client)
            .field("renewal_lead", &self.renewal_lead)
            .finish()
    }
}

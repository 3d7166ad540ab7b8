//! Session Persistence
//!
//! This module persists the authenticated session across restarts under five
//! fixed keys: the token pair in the platform secure store and the cached
//! user fields in the settings store.
//!
//! ## Security Features
//!
//! - Token values are never logged or exposed in error messages
//! - Tokens live in the platform secure store (Keychain, Keystore, etc.)
//! - `clear()` removes every key and is idempotent, so a failed remote
//!   sign-out can never leave credentials behind
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{SessionStore, TokenPair, UserProfile};
//! use std::sync::Arc;
//! # use bridge_traits::{SecureStore, SettingsStore};
//! # async fn example(
//! #     secure_store: Arc<dyn SecureStore>,
//! #     settings_store: Arc<dyn SettingsStore>,
//! # ) -> core_auth::Result<()> {
//! let store = SessionStore::new(secure_store, settings_store);
//!
//! if let Some(stored) = store.load().await? {
//!     println!("Found session for {}", stored.user.email);
//! }
//!
//! store.clear().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{TokenPair, UserProfile};
use bridge_traits::{SecureStore, SettingsStore};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Storage key for the access token (secure store).
pub const KEY_ACCESS_TOKEN: &str = "accessToken";
/// Storage key for the refresh token (secure store).
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
/// Storage key for the cached first name (settings store).
pub const KEY_FIRST_NAME: &str = "firstName";
/// Storage key for the cached last name (settings store).
pub const KEY_LAST_NAME: &str = "lastName";
/// Storage key for the cached email (settings store).
pub const KEY_EMAIL: &str = "email";

/// Expiry timestamp rides alongside the access token so a restart can
/// schedule renewal without a validation round trip.
const KEY_EXPIRES_AT: &str = "accessTokenExpiresAt";

/// A session as loaded from storage.
///
/// The verified flag is not persisted; it is re-established by validating
/// the token on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Persists the session under the five fixed storage keys.
///
/// Tokens go to the [`SecureStore`]; the cached user fields go to the
/// [`SettingsStore`]. Partial or corrupt state loads as "no session".
#[derive(Clone)]
pub struct SessionStore {
    secure_store: Arc<dyn SecureStore>,
    settings_store: Arc<dyn SettingsStore>,
}

impl SessionStore {
    /// Create a new session store.
    pub fn new(secure_store: Arc<dyn SecureStore>, settings_store: Arc<dyn SettingsStore>) -> Self {
        debug!("Initializing SessionStore");
        Self {
            secure_store,
            settings_store,
        }
    }

    /// Persist tokens and user fields, overwriting any previous session.
    pub async fn save(&self, tokens: &TokenPair, user: &UserProfile) -> Result<()> {
        self.save_tokens(tokens).await?;

        self.settings_store
            .set_string(KEY_FIRST_NAME, &user.first_name)
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;
        self.settings_store
            .set_string(KEY_LAST_NAME, &user.last_name)
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;
        self.settings_store
            .set_string(KEY_EMAIL, &user.email)
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;

        info!("Session persisted");
        Ok(())
    }

    /// Persist only the token pair, leaving the cached user fields intact.
    ///
    /// Used after a refresh, which rotates tokens without touching the user.
    pub async fn save_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.secure_store
            .set_secret(KEY_ACCESS_TOKEN, tokens.access_token.as_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store access token");
                AuthError::StorageUnavailable(e.to_string())
            })?;
        self.secure_store
            .set_secret(KEY_REFRESH_TOKEN, tokens.refresh_token.as_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store refresh token");
                AuthError::StorageUnavailable(e.to_string())
            })?;
        self.secure_store
            .set_secret(
                KEY_EXPIRES_AT,
                tokens.expires_at.timestamp().to_string().as_bytes(),
            )
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Load the persisted session, if a complete one exists.
    ///
    /// Returns `Ok(None)` when any required key is missing or unreadable;
    /// a partially-written session never surfaces as authenticated.
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        let access_token = match self.get_secret_string(KEY_ACCESS_TOKEN).await? {
            Some(value) => value,
            None => {
                debug!("No stored access token");
                return Ok(None);
            }
        };

        let refresh_token = match self.get_secret_string(KEY_REFRESH_TOKEN).await? {
            Some(value) => value,
            None => {
                debug!("Stored access token without refresh token, treating as no session");
                return Ok(None);
            }
        };

        let expires_at = match self.load_expires_at().await? {
            Some(value) => value,
            // Legacy or partial state: validation will establish real expiry.
            None => Utc::now(),
        };

        let first_name = self.get_setting(KEY_FIRST_NAME).await?;
        let last_name = self.get_setting(KEY_LAST_NAME).await?;
        let email = self.get_setting(KEY_EMAIL).await?;

        let (Some(first_name), Some(last_name), Some(email)) = (first_name, last_name, email)
        else {
            debug!("Stored tokens without user fields, treating as no session");
            return Ok(None);
        };

        Ok(Some(StoredSession {
            tokens: TokenPair {
                access_token,
                refresh_token,
                expires_at,
            },
            user: UserProfile {
                email,
                first_name,
                last_name,
            },
        }))
    }

    /// Load only the stored refresh token.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.get_secret_string(KEY_REFRESH_TOKEN).await
    }

    /// Remove every stored key.
    ///
    /// Idempotent; missing keys are not an error. Clearing continues past
    /// individual failures so a flaky store cannot leave credentials behind,
    /// and the first error is reported after all deletes were attempted.
    pub async fn clear(&self) -> Result<()> {
        let mut first_error: Option<AuthError> = None;

        for key in [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_EXPIRES_AT] {
            if let Err(e) = self.secure_store.delete_secret(key).await {
                warn!(key, error = %e, "Failed to delete secret");
                first_error.get_or_insert(AuthError::StorageUnavailable(e.to_string()));
            }
        }

        for key in [KEY_FIRST_NAME, KEY_LAST_NAME, KEY_EMAIL] {
            if let Err(e) = self.settings_store.delete(key).await {
                warn!(key, error = %e, "Failed to delete setting");
                first_error.get_or_insert(AuthError::StorageUnavailable(e.to_string()));
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => {
                info!("Session cleared");
                Ok(())
            }
        }
    }

    async fn get_secret_string(&self, key: &str) -> Result<Option<String>> {
        let raw = self
            .secure_store
            .get_secret(key)
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))?;

        match raw {
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    warn!(key, "Stored secret is not valid UTF-8, ignoring");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn load_expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.get_secret_string(KEY_EXPIRES_AT).await? else {
            return Ok(None);
        };

        match raw.parse::<i64>() {
            Ok(ts) => Ok(Utc.timestamp_opt(ts, 0).single()),
            Err(_) => {
                warn!("Stored expiry timestamp is corrupt, ignoring");
                Ok(None)
            }
        }
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.settings_store
            .get_string(key)
            .await
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))
    }
}

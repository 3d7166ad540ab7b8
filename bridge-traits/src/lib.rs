//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the file-drive core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be provided differently per platform (desktop,
//! mobile, web view host).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations for the identity
//!   backend and binary downloads
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Token persistence
//!   (Keychain/Keystore/DPAPI)
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage for
//!   cached user fields
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing of the
//!   session renewal schedule
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let secure_store = config.secure_store
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "SecureStore".to_string(),
//!         message: "No secure storage implementation provided. \
//!                  Desktop: enable the desktop-shims feature. \
//!                  Other hosts: inject a platform-native adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError`
//! and provide actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{SecureStore, SettingsStore};
pub use time::{Clock, SystemClock};

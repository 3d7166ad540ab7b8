//! # Desktop Bridge Implementations
//!
//! Desktop adapters for the platform capability traits:
//!
//! - [`ReqwestHttpClient`] — HTTP and binary downloads via reqwest
//! - [`KeyringSecureStore`] — token persistence in the OS keychain
//! - [`SqliteSettingsStore`] — durable key-value settings in SQLite
//!
//! These are the defaults injected by `CoreConfig` when the `desktop-shims`
//! feature is enabled.

pub mod http;
#[cfg(feature = "secure-store")]
pub mod secure_store;
pub mod settings;

pub use http::ReqwestHttpClient;
#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
pub use settings::SqliteSettingsStore;

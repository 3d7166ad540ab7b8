//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, secure
//! storage, settings) into the session manager and drive service. Desktop
//! apps typically enable the `desktop-shims` feature so [`CoreConfig`]
//! injects keyring/SQLite/reqwest defaults; other hosts inject their own
//! bridge adapters.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://id.example.com")
//!     .settings_db_path("/path/to/settings.db")
//!     .build()?;
//!
//! let core = CoreService::new(config)?;
//! core.initialize().await?;
//!
//! match core.route_decision().await {
//!     RouteDecision::Allow => { /* render the drive */ }
//!     RouteDecision::RedirectToLogin => { /* show login */ }
//!     _ => {}
//! }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{Clock, HttpClient, SecureStore, SettingsStore};
use core_auth::{
    IdentityClient, RouteDecision, RouteGuard, SessionManager, SessionStore,
};
use core_drive::{DriveCatalog, DriveService, MockCatalog};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use tokio::sync::broadcast;
use tracing::info;

/// Aggregated handle to the bridge dependencies the core requires.
///
/// Convenience for hosts that already hold bridge handles and do not need
/// the builder's default injection.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        settings_store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            secure_store,
            settings_store,
            clock,
        }
    }

    /// Build a [`CoreConfig`] for these bridges.
    pub fn into_config(self, api_base_url: impl Into<String>) -> Result<CoreConfig> {
        let config = CoreConfig::builder()
            .api_base_url(api_base_url)
            .http_client(self.http_client)
            .secure_store(self.secure_store)
            .settings_store(self.settings_store)
            .clock(self.clock)
            .build()?;
        Ok(config)
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the event bus and constructs the session manager and drive service
/// from a validated [`CoreConfig`]. Cheap to clone.
#[derive(Clone)]
pub struct CoreService {
    event_bus: EventBus,
    session: SessionManager,
    drive: DriveService,
}

impl CoreService {
    /// Wire the core from a validated configuration.
    ///
    /// The drive backend defaults to the in-process [`MockCatalog`]; use
    /// [`with_catalog`](Self::with_catalog) to substitute another backend.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_catalog(config, Arc::new(MockCatalog::new()))
    }

    /// Wire the core with an explicit drive catalog.
    pub fn with_catalog(config: CoreConfig, catalog: Arc<dyn DriveCatalog>) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);

        let client = IdentityClient::new(&config.api_base_url, config.http_client.clone());
        let store = SessionStore::new(config.secure_store.clone(), config.settings_store.clone());
        let session = SessionManager::new(
            client,
            store,
            event_bus.clone(),
            config.clock.clone(),
            config.renewal_lead,
        );

        let drive = DriveService::new(catalog, config.http_client.clone(), event_bus.clone());

        info!(api_base_url = %config.api_base_url, "Core service wired");
        Ok(Self {
            event_bus,
            session,
            drive,
        })
    }

    /// Settle the startup auth state from persisted credentials.
    pub async fn initialize(&self) -> Result<()> {
        self.session.initialize().await?;
        Ok(())
    }

    /// Cancel background work. In-flight requests are discarded, not
    /// interrupted.
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
        info!("Core service shut down");
    }

    /// The session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The drive service.
    pub fn drive(&self) -> &DriveService {
        &self.drive
    }

    /// Subscribe to core events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// The event bus, for hosts that wire their own fan-out.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// What the host should render for a protected route right now.
    pub async fn route_decision(&self) -> RouteDecision {
        let state = self.session.state().await;
        let session = self.session.current_session().await;
        RouteGuard::evaluate(state, session.as_ref())
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService").finish()
    }
}

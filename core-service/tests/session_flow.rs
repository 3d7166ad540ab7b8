//! End-to-end flows through the façade: startup, login, route decisions,
//! refresh failure, and drive lookups.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::{SecureStore, SettingsStore};
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use core_auth::{AuthError, RouteDecision, SessionStore, TokenPair, UserProfile};
use core_drive::{MockCatalog, MockLatency};
use core_runtime::config::CoreConfig;
use core_service::CoreService;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const NOW: i64 = 1_700_000_000;

#[derive(Default)]
struct ScriptedHttpClient {
    responses: Mutex<HashMap<String, (u16, String)>>,
}

impl ScriptedHttpClient {
    fn respond(&self, path_suffix: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path_suffix.to_string(), (status, body.to_string()));
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let responses = self.responses.lock().unwrap();
        let entry = responses
            .iter()
            .find(|(suffix, _)| request.url.ends_with(suffix.as_str()));

        let Some((_, (status, body))) = entry else {
            return Err(BridgeError::Network(format!(
                "no script for {}",
                request.url
            )));
        };

        Ok(HttpResponse {
            status: *status,
            headers: HashMap::new(),
            body: Bytes::from(body.clone()),
        })
    }

    async fn download(&self, _url: &str) -> BridgeResult<Bytes> {
        Ok(Bytes::from_static(b"content"))
    }
}

#[derive(Default)]
struct MemorySecureStore {
    secrets: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.secrets
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.secrets.lock().unwrap().get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.secrets.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.secrets.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.secrets.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
            .await
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.get_string(key).await?.map(|v| v == "true"))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.values.lock().unwrap().contains_key(key))
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.values.lock().unwrap().clear();
        Ok(())
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct Harness {
    core: CoreService,
    http: Arc<ScriptedHttpClient>,
    secure: Arc<MemorySecureStore>,
    settings: Arc<MemorySettingsStore>,
}

fn harness() -> Harness {
    let http = Arc::new(ScriptedHttpClient::default());
    let secure = Arc::new(MemorySecureStore::default());
    let settings = Arc::new(MemorySettingsStore::default());

    let config = CoreConfig::builder()
        .api_base_url("https://id.example.com")
        .http_client(http.clone())
        .secure_store(secure.clone())
        .settings_store(settings.clone())
        .clock(Arc::new(FixedClock(
            Utc.timestamp_opt(NOW, 0).single().unwrap(),
        )))
        .build()
        .unwrap();

    let catalog = Arc::new(MockCatalog::with_latency(MockLatency::zero()));
    let core = CoreService::with_catalog(config, catalog).unwrap();
    Harness {
        core,
        http,
        secure,
        settings,
    }
}

async fn seed_stored_session(h: &Harness) {
    let store = SessionStore::new(h.secure.clone(), h.settings.clone());
    let tokens = TokenPair {
        access_token: "stored-access".to_string(),
        refresh_token: "stored-refresh".to_string(),
        expires_at: Utc.timestamp_opt(NOW + 3600, 0).single().unwrap(),
    };
    let user = UserProfile {
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    };
    store.save(&tokens, &user).await.unwrap();
}

fn login_body(email_verified: bool) -> String {
    format!(
        r#"{{
            "accessToken": "access-1",
            "refreshToken": "refresh-1",
            "expiresIn": 3600,
            "email": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "emailVerified": {email_verified}
        }}"#
    )
}

fn validate_body(email_verified: bool) -> String {
    format!(
        r#"{{
            "expiresAt": {expires},
            "email": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "emailVerified": {email_verified}
        }}"#,
        expires = NOW + 3600
    )
}

#[tokio::test]
async fn test_login_then_protected_route_allows() {
    let h = harness();
    h.core.initialize().await.unwrap();
    assert_eq!(h.core.route_decision().await, RouteDecision::RedirectToLogin);

    h.http.respond("/auth/login", 200, &login_body(true));
    h.core
        .session()
        .login("ada@example.com", "hunter2")
        .await
        .unwrap();

    assert_eq!(h.core.route_decision().await, RouteDecision::Allow);
}

#[tokio::test]
async fn test_unverified_login_carries_email_in_error() {
    let h = harness();
    h.core.initialize().await.unwrap();
    h.http.respond(
        "/auth/login",
        403,
        r#"{"error":{"message":"Email not verified","errorCode":"email-not-verified"}}"#,
    );

    let err = h
        .core
        .session()
        .login("ada@example.com", "hunter2")
        .await
        .unwrap_err();

    match err {
        AuthError::EmailNotVerified { email } => assert_eq!(email, "ada@example.com"),
        other => panic!("expected EmailNotVerified, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unverified_session_redirects_to_verify_email() {
    let h = harness();
    seed_stored_session(&h).await;
    h.http
        .respond("/auth/validate-token", 200, &validate_body(false));

    h.core.initialize().await.unwrap();

    assert_eq!(
        h.core.route_decision().await,
        RouteDecision::RedirectToVerifyEmail {
            email: "ada@example.com".to_string()
        }
    );
}

#[tokio::test]
async fn test_refresh_failure_clears_session_and_redirects_to_login() {
    let h = harness();
    h.http.respond("/auth/login", 200, &login_body(true));
    h.http.respond(
        "/auth/refresh-token",
        401,
        r#"{"message":"revoked","errorCode":"token-expired"}"#,
    );

    h.core.initialize().await.unwrap();
    h.core
        .session()
        .login("ada@example.com", "hunter2")
        .await
        .unwrap();

    let result = h.core.session().refresh_session().await;
    assert!(result.is_err());

    assert_eq!(h.core.route_decision().await, RouteDecision::RedirectToLogin);
    assert!(h.secure.secrets.lock().unwrap().is_empty());
    assert!(h.settings.values.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_file_data_yields_not_found() {
    let h = harness();
    let mut file = h
        .core
        .drive()
        .list_files(&core_drive::FileSort::default())
        .await
        .unwrap()
        .remove(0);
    file.file_data_id = "d999".to_string();

    let err = h.core.drive().open_preview(&file).await.unwrap_err();
    assert!(matches!(err, core_drive::DriveError::NotFound { .. }));
}

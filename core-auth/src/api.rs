//! Identity API Client
//!
//! Typed client for the identity backend. Every endpoint has a concrete
//! request/response type validated at the HTTP boundary; malformed bodies
//! fail the call instead of leaking loosely-typed JSON into the core.
//!
//! Failure responses arrive in one of two envelope shapes:
//!
//! ```json
//! { "error": { "message": "...", "errorCode": "..." } }
//! { "message": "...", "errorCode": "..." }
//! ```
//!
//! Both parse into [`ApiFailure`]. Known backend codes map to [`ErrorCode`];
//! unknown codes are preserved verbatim.

use crate::error::{AuthError, Result};
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Backend error codes the core reacts to.
///
/// Unknown codes are carried through as [`ErrorCode::Other`] so hosts can
/// still display them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    EmailNotVerified,
    InvalidCredential,
    UserDisabled,
    TokenExpired,
    Other(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "email-not-verified" => ErrorCode::EmailNotVerified,
            "invalid-credential" => ErrorCode::InvalidCredential,
            "user-disabled" => ErrorCode::UserDisabled,
            "token-expired" => ErrorCode::TokenExpired,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::EmailNotVerified => "email-not-verified",
            ErrorCode::InvalidCredential => "invalid-credential",
            ErrorCode::UserDisabled => "user-disabled",
            ErrorCode::TokenExpired => "token-expired",
            ErrorCode::Other(code) => code,
        }
    }
}

/// Parsed failure body from a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Deserialize)]
struct FlatFailureBody {
    message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

#[derive(Deserialize)]
struct WrappedFailureBody {
    error: FlatFailureBody,
}

impl ApiFailure {
    /// Parse a failure body, accepting both the wrapped and the flat shape.
    ///
    /// An unparseable body yields a generic message so the original status
    /// is never swallowed.
    pub fn from_body(body: &[u8]) -> Self {
        if let Ok(wrapped) = serde_json::from_slice::<WrappedFailureBody>(body) {
            return Self {
                message: wrapped
                    .error
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
                error_code: wrapped.error.error_code,
            };
        }

        if let Ok(flat) = serde_json::from_slice::<FlatFailureBody>(body) {
            if flat.message.is_some() || flat.error_code.is_some() {
                return Self {
                    message: flat.message.unwrap_or_else(|| "Unknown error".to_string()),
                    error_code: flat.error_code,
                };
            }
        }

        Self {
            message: "Unknown error".to_string(),
            error_code: None,
        }
    }
}

// ============================================================================
// Request / response payloads
// ============================================================================

/// Registration request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
}

/// Successful token validation response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    /// Unix timestamp (seconds) at which the access token expires
    pub expires_at: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Successful token refresh response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the new access token expires
    pub expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailPayload<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNameRequest<'a> {
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload<'a> {
    token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotpConfirmRequest<'a> {
    code: &'a str,
}

/// TOTP enrollment parameters returned by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpSetupResponse {
    /// Base32 shared secret for manual entry
    pub secret: String,
    /// `otpauth://` provisioning URL for QR rendering
    pub otpauth_url: String,
}

// ============================================================================
// Client
// ============================================================================

/// Typed client for the identity backend.
///
/// All methods map a non-2xx response to [`AuthError::Api`] carrying the
/// parsed [`ApiFailure`], and transport failures to [`AuthError::Network`].
/// Callers treat both identically unless they react to a specific error code.
#[derive(Clone)]
pub struct IdentityClient {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
}

impl IdentityClient {
    /// Creates a new identity client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend base URL without a trailing slash
    /// * `http_client` - Host-provided HTTP client abstraction
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, endpoint: &str, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if response.is_success() {
            return Ok(response);
        }

        let failure = ApiFailure::from_body(&response.body);
        warn!(
            endpoint,
            status = response.status,
            code = failure.error_code.as_deref().unwrap_or("-"),
            "Identity API call failed"
        );

        Err(AuthError::Api {
            endpoint: endpoint.to_string(),
            status: response.status,
            message: failure.message,
            code: failure.error_code,
        })
    }

    fn parse<T: serde::de::DeserializeOwned>(endpoint: &str, response: &HttpResponse) -> Result<T> {
        response.json().map_err(|e| {
            AuthError::SerializationFailed(format!("{} response: {}", endpoint, e))
        })
    }

    /// Register a new account.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<()> {
        let endpoint = self.endpoint("/auth/register");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(payload)
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Exchange credentials for a token pair and user fields.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let endpoint = self.endpoint("/auth/login");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&LoginRequest { email, password })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        let response = self.send(&endpoint, request).await?;
        Self::parse(&endpoint, &response)
    }

    /// Validate an access token and fetch the current user fields.
    pub async fn validate_token(&self, access_token: &str) -> Result<ValidateTokenResponse> {
        let endpoint = self.endpoint("/auth/validate-token");
        let request = HttpRequest::new(HttpMethod::Get, &endpoint).bearer_token(access_token);
        let response = self.send(&endpoint, request).await?;
        Self::parse(&endpoint, &response)
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let endpoint = self.endpoint("/auth/refresh-token");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&RefreshRequest { refresh_token })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        let response = self.send(&endpoint, request).await?;
        Self::parse(&endpoint, &response)
    }

    /// Invalidate the session on the backend.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/logout");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint).bearer_token(access_token);
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Request a password reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/request-password-reset");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&EmailPayload { email })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/reset-password");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&ResetPasswordRequest {
                token,
                new_password,
            })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Change the password of the signed-in account.
    pub async fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let endpoint = self.endpoint("/auth/change-password");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .bearer_token(access_token)
            .json(&ChangePasswordRequest {
                current_password,
                new_password,
            })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Update the display name of the signed-in account.
    pub async fn update_name(
        &self,
        access_token: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        let endpoint = self.endpoint("/auth/update-name");
        let request = HttpRequest::new(HttpMethod::Patch, &endpoint)
            .bearer_token(access_token)
            .json(&UpdateNameRequest {
                first_name,
                last_name,
            })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Ask the backend to (re)send the verification email.
    pub async fn send_verification_email(&self, email: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/send-verification-email");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&EmailPayload { email })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Confirm an email address with the emailed token.
    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/verify-email");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .json(&TokenPayload { token })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Begin TOTP two-factor enrollment.
    pub async fn totp_setup(&self, access_token: &str) -> Result<TotpSetupResponse> {
        let endpoint = self.endpoint("/auth/totp/setup");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint).bearer_token(access_token);
        let response = self.send(&endpoint, request).await?;
        Self::parse(&endpoint, &response)
    }

    /// Confirm TOTP enrollment with a code from the authenticator app.
    pub async fn totp_confirm(&self, access_token: &str, code: &str) -> Result<()> {
        let endpoint = self.endpoint("/auth/totp/confirm");
        let request = HttpRequest::new(HttpMethod::Post, &endpoint)
            .bearer_token(access_token)
            .json(&TotpConfirmRequest { code })
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

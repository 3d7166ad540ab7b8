use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{endpoint} failed with status {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Email address {email} is not verified")]
    EmailNotVerified { email: String },

    #[error("Secure storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, AuthError>;

/*
[INPUT]:  Error sources (signing, key/signature parsing, identity gate, HTTP, storage)
[OUTPUT]: Structured error type shared by the whole crate
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for Banana Split
#[derive(Error, Debug)]
pub enum BananaError {
    /// No wallet is connected to sign with
    #[error("No wallet available")]
    SigningUnavailable,

    /// The signer declined the request
    #[error("Signature request rejected: {0}")]
    UserRejected(String),

    /// A signing request is already outstanding for this signer
    #[error("A signing request is already in flight")]
    SigningInFlight,

    /// Signature is not valid hex or cannot be recovered
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// Private key does not parse
    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    /// Wallet address does not parse
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// Session email is outside the allow-listed domain
    #[error("Email domain rejected for {email}")]
    DomainRejected { email: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Access token missing, expired or not accepted
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Redirect parameter storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BananaError {
    /// Check if error indicates an authentication or identity failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            BananaError::Unauthorized(_) | BananaError::DomainRejected { .. }
        )
    }

    /// Check if error came out of a signing or recovery step
    pub fn is_signing_error(&self) -> bool {
        matches!(
            self,
            BananaError::SigningUnavailable
                | BananaError::UserRejected(_)
                | BananaError::SigningInFlight
                | BananaError::MalformedSignature(_)
                | BananaError::MalformedKey(_)
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        BananaError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Banana Split operations
pub type Result<T> = std::result::Result<T, BananaError>;

//! Error types for lens-kit.
//!
//! This module provides the error types for all lens-kit operations.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by most operations
//!   - [`ApiError`] - GraphQL transport and server errors
//!   - [`AuthError`] - Session and token refresh failures
//!   - [`SignerError`] - Signing operation failures
//!   - [`StorageError`] - Session store failures
//!   - [`ParseAddressError`] - Invalid EVM address format
//!
//! # Read vs. Write Paths
//!
//! Client construction degrades to an unauthenticated handle when a token
//! cannot be refreshed. Everything else reports a typed error, so a caller
//! can tell a missing profile from a network failure:
//!
//! ```rust,no_run
//! use lens_kit::*;
//!
//! # async fn example() -> Result<(), Error> {
//! let lens = Lens::mainnet().build();
//!
//! match lens.fetch_profile("0x01").await {
//!     Ok(found) => println!("{} publications", found.publications.len()),
//!     Err(Error::ProfileNotFound(id)) => println!("No profile {}", id),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Error parsing an EVM address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("Address '{0}' is missing the 0x prefix")]
    MissingPrefix(String),

    #[error("Invalid hex in address: '{0}'")]
    InvalidHex(String),

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Error parsing a 65-byte EVM signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseSignatureError {
    #[error("Invalid hex in signature: {0}")]
    InvalidHex(String),

    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid recovery byte: {0}")]
    InvalidRecoveryId(u8),
}

/// Error encoding or hashing EIP-712 typed data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypedDataError {
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Missing field '{field}' in struct '{struct_name}'")]
    MissingField { struct_name: String, field: String },

    #[error("Invalid value for '{field}' of type '{ty}': {reason}")]
    InvalidValue {
        field: String,
        ty: String,
        reason: String,
    },

    #[error("Cannot determine primary type: {0}")]
    PrimaryType(String),
}

/// Error during signing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Typed data error: {0}")]
    TypedData(#[from] TypedDataError),
}

/// Error during session store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),
}

// ============================================================================
// API Errors
// ============================================================================

/// GraphQL API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    // ─── Network/Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        retryable: bool,
    },

    #[error("Timeout after {0} retries")]
    Timeout(u32),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── GraphQL ───
    #[error("GraphQL error: {message}{}", code.as_deref().map(|c| format!(" (code: {})", c)).unwrap_or_default())]
    GraphQl {
        message: String,
        code: Option<String>,
    },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
}

impl ApiError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Timeout(_) => true,
            ApiError::Network { retryable, .. } => *retryable,
            ApiError::GraphQl { code, .. } => {
                matches!(code.as_deref(), Some("INTERNAL_SERVER_ERROR"))
            }
            _ => false,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>, status_code: Option<u16>, retryable: bool) -> Self {
        ApiError::Network {
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Returns true if the server rejected the request's credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated(_))
    }
}

// ============================================================================
// Auth Errors
// ============================================================================

/// Errors while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No stored session. Call Lens::authenticate() first.")]
    NoSession,

    #[error("Stored session is malformed: {0}")]
    InvalidSession(String),

    #[error("Refresh token rejected: {0}")]
    RefreshRejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for lens-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("No signer configured. Call .signer() or .private_key() on LensBuilder.")]
    NoSigner,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Lookups ───
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    // ─── API ───
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    // ─── Signing ───
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),

    // ─── Storage ───
    #[error(transparent)]
    Storage(#[from] StorageError),

    // ─── Parsing ───
    #[error(transparent)]
    ParseAddress(#[from] ParseAddressError),

    #[error(transparent)]
    ParseSignature(#[from] ParseSignatureError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error means the requested profile does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ProfileNotFound(_))
    }

    /// Returns true if this error came from a missing or rejected session.
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            Error::Api(api) => api.is_unauthenticated(),
            _ => false,
        }
    }
}

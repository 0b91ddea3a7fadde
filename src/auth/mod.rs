use std::collections::BTreeSet;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod keys;
pub mod signer;
pub mod verifier;

pub use keys::{KeySet, KeySetError};
pub use signer::TokenSigner;
pub use verifier::TokenVerifier;

/// Permission strings granted to API clients.
pub mod permissions {
    pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
    pub const POST_DRINKS: &str = "post:drinks";
    pub const PATCH_DRINKS: &str = "patch:drinks";
    pub const DELETE_DRINKS: &str = "delete:drinks";
}

/// Claim set of a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl AuthClaims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Subject for log lines, tokens without `sub` are reported as anonymous.
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("anonymous")
    }
}

/// Reasons a request fails authorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingToken,

    #[error("Authorization header must be of the form 'Bearer <token>'.")]
    MalformedHeader,

    #[error("Unable to verify token signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("Permission '{0}' not granted.")]
    PermissionDenied(String),
}

impl AuthError {
    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::PermissionDenied(_) => "permission_denied",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

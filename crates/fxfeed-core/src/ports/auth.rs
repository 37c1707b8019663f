//! Identity verification port.
//!
//! Sign-up, sign-in and password flows live with the external identity
//! provider; the backend only verifies bearer tokens it issues.

use crate::domain::Actor;

/// Role that may review KYC submissions and act on any user's records.
pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by a verified bearer token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    /// Store uid of the caller (`users/{uid}`).
    pub uid: String,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

impl TokenClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            uid: self.uid.clone(),
            is_admin: self.has_role(ADMIN_ROLE),
        }
    }
}

/// Token service trait for bearer-token operations.
pub trait TokenService: Send + Sync {
    /// Issue a token for `uid`.
    fn generate_token(&self, uid: &str, email: &str, roles: Vec<String>) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

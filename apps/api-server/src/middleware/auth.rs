//! Bearer-token identity extractors.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use fxfeed_core::domain::Actor;
use fxfeed_core::ports::{ADMIN_ROLE, AuthError, TokenClaims, TokenService};

use crate::middleware::error::AppError;

/// Verified caller. Extracting it rejects the request with 401 when the
/// token is missing or invalid.
///
/// ```ignore
/// async fn submit(identity: Identity) -> AppResult<HttpResponse> {
///     identity.ensure_can_act_for(&user_id)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    /// Store uid (`users/{uid}`).
    pub uid: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            uid: self.uid.clone(),
            is_admin: self.is_admin(),
        }
    }

    /// Per-user routes: the caller must be `uid` or an admin.
    pub fn ensure_can_act_for(&self, uid: &str) -> Result<(), AppError> {
        if self.actor().can_act_for(uid) {
            Ok(())
        } else {
            tracing::warn!(caller = %self.uid, target_user = %uid, "Cross-user access denied");
            Err(AppError::Forbidden(
                "You can only access your own records".to_string(),
            ))
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            uid: claims.uid,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let Some(token_service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()).into());
    };

    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = token_service.validate_token(token)?;
    Ok(Identity::from(claims))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

//! Application error type and its JSON envelope.

use std::error::Error as _;
use std::sync::OnceLock;
use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use fxfeed_core::ports::{AuthError, UploadError};
use fxfeed_core::{DomainError, StoreError};
use fxfeed_shared::{ErrorResponse, FieldErrorBody};

static DEVELOPMENT: OnceLock<bool> = OnceLock::new();

/// Include error chains in response bodies. Set once at startup.
pub fn set_development_mode(enabled: bool) {
    let _ = DEVELOPMENT.set(enabled);
}

fn development_mode() -> bool {
    DEVELOPMENT.get().copied().unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    BadRequest(String),

    /// Body or query that could not be decoded at all.
    #[error("{0}")]
    Payload(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Too many requests. Try again in {} seconds.", .retry_after.as_secs().max(1))]
    RateLimited { retry_after: Duration },
}

impl AppError {
    /// Envelope sent to the client, without the request id.
    pub fn body(&self) -> ErrorResponse {
        let status = self.status_code().as_u16();
        let mut body = match self {
            AppError::Domain(DomainError::Validation(errors)) => {
                ErrorResponse::bad_request("Validation failed").with_errors(
                    errors
                        .fields()
                        .iter()
                        .map(|e| FieldErrorBody {
                            field: e.field.to_string(),
                            message: e.message.clone(),
                        })
                        .collect(),
                )
            }
            AppError::Domain(DomainError::Conflict(msg)) => ErrorResponse::new(status, msg.clone()),
            AppError::Domain(DomainError::Store(StoreError::Conflict { .. })) => {
                ErrorResponse::new(status, "The record changed too often; try again")
            }
            AppError::Domain(DomainError::Store(StoreError::InvalidPath(_))) => {
                ErrorResponse::bad_request(self.to_string())
            }
            AppError::Domain(DomainError::Store(_)) => ErrorResponse::internal_error(),
            AppError::Upload(UploadError::Upstream(_)) => {
                ErrorResponse::new(status, "Asset host unavailable")
            }
            AppError::Auth(AuthError::MissingAuth) => ErrorResponse::new(
                status,
                "Authentication required. Send a Bearer token in the Authorization header.",
            ),
            AppError::Auth(AuthError::TokenExpired) => {
                ErrorResponse::new(status, "Your session has expired. Please sign in again.")
            }
            AppError::Auth(AuthError::InvalidToken(_)) => ErrorResponse::unauthorized(),
            other => ErrorResponse::new(status, other.to_string()),
        };

        if development_mode() {
            body = body.with_stack(self.chain());
        }
        body
    }

    /// Debug form of the error and every source below it.
    fn chain(&self) -> String {
        let mut chain = format!("{self:?}");
        let mut source = self.source();
        while let Some(err) = source {
            chain.push_str(&format!("\ncaused by: {err}"));
            source = err.source();
        }
        chain
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(err) => match err {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
                DomainError::Store(StoreError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
                DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(AuthError::InsufficientPermissions) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Upload(err) => match err {
                UploadError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                UploadError::Rejected(_) => StatusCode::BAD_REQUEST,
                UploadError::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Payload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let mut response = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after } = self {
            response
                .insert_header(("Retry-After", retry_after.as_secs().max(1).to_string()))
                .insert_header(("X-RateLimit-Remaining", "0"));
        }
        response.json(self.body())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

//! Health check endpoint.

use actix_web::HttpResponse;
use fxfeed_shared::dto::HealthResponse;

/// GET /api/health
///
/// Bare body, not the usual envelope: load balancers read `status` directly.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(chrono::Utc::now()))
}

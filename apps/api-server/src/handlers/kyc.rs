//! Identity verification endpoints.

use actix_web::{HttpResponse, web};
use fxfeed_core::DomainError;
use fxfeed_core::domain::{KycDecision, KycDocument};
use fxfeed_shared::ApiResponse;
use serde::Deserialize;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KycSubmission {
    #[serde(default)]
    pub documents: Vec<KycDocument>,
}

/// GET /api/kyc/{user_id}
pub async fn get_kyc(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    identity.ensure_can_act_for(&user_id)?;

    let record = state
        .menu
        .get_kyc(&user_id)
        .await?
        .ok_or_else(|| DomainError::not_found("KYC record", user_id))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(record)))
}

/// POST /api/kyc/{user_id}
///
/// Only the user themself may submit; admins review, they do not submit.
pub async fn submit_kyc(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<KycSubmission>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    if identity.uid != user_id {
        return Err(AppError::Forbidden(
            "You can only submit your own documents".to_string(),
        ));
    }

    let record = state
        .menu
        .submit_kyc(&user_id, body.into_inner().documents)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        record,
        "Documents submitted for review",
    )))
}

/// PUT /api/kyc/{user_id}/status
pub async fn set_status(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<KycDecision>,
) -> AppResult<HttpResponse> {
    if !identity.is_admin() && !state.skip_admin_check {
        tracing::warn!(caller = %identity.uid, "Non-admin attempted a KYC review");
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let user_id = path.into_inner();
    let record = state.menu.set_kyc_status(&user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(record, "KYC status updated")))
}

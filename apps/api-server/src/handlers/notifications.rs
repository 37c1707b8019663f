//! Notification preferences, the notification inbox, and asset uploads.

use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpResponse, web};
use fxfeed_core::domain::NotificationPreferencesUpdate;
use fxfeed_core::ports::UploadRequest;
use fxfeed_shared::ApiResponse;
use fxfeed_shared::dto::{UploadQuery, UploadResponse};
use futures::TryStreamExt;
use serde_json::json;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// GET /api/notifications/{user_id}
pub async fn get_preferences(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let prefs = state.menu.get_notification_preferences(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(prefs)))
}

/// PUT /api/notifications/{user_id}
pub async fn update_preferences(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<NotificationPreferencesUpdate>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let prefs = state
        .menu
        .update_notification_preferences(&path, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(prefs, "Preferences updated")))
}

/// GET /api/notifications/{user_id}/items
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let items = state.notifications.list(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/// POST /api/notifications/{user_id}/items/{id}/read
pub async fn mark_read(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (user_id, id) = path.into_inner();
    identity.ensure_can_act_for(&user_id)?;
    let item = state.notifications.mark_read(&user_id, &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

/// POST /api/notifications/{user_id}/items/read-all
pub async fn mark_all_read(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let updated = state.notifications.mark_all_read(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "updated": updated }))))
}

/// Largest file accepted by `POST /api/notifications/upload`.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Form field carrying the file.
const FILE_FIELD: &str = "file";

/// POST /api/notifications/upload?folder=
///
/// `multipart/form-data` with the file in the `file` part; the part's
/// filename and content type are forwarded with it to the asset host.
pub async fn upload(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    query: web::Query<UploadQuery>,
    mut form: Multipart,
) -> AppResult<HttpResponse> {
    let mut file = None;
    while let Some(mut field) = form.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) || file.is_some() {
            // Unused parts are drained so the next one can be read.
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| name.trim().to_string())
            .unwrap_or_default();
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest("File exceeds the 10 MiB limit".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }
        file = Some((filename, content_type, bytes));
    }

    let Some((filename, content_type, bytes)) = file else {
        return Err(AppError::BadRequest(format!("Missing '{FILE_FIELD}' part")));
    };
    if filename.is_empty() {
        return Err(AppError::BadRequest("filename is required".to_string()));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    tracing::info!(
        user_id = %identity.uid,
        request_id = request_id.as_str(),
        filename = %filename,
        bytes = bytes.len(),
        "Forwarding upload"
    );
    let asset = state
        .uploader
        .upload(UploadRequest {
            filename,
            content_type,
            bytes,
            folder: query.into_inner().folder,
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(UploadResponse {
        url: asset.url,
        public_id: asset.public_id,
        bytes: asset.bytes,
        format: asset.format,
    })))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {err}"))
}

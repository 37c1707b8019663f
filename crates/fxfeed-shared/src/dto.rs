//! Data Transfer Objects - request/response bodies that are not stored
//! entities. Entities themselves travel in their stored camelCase shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `POST /api/news`. The owner is taken from the caller's identity, never
/// from the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `POST /api/news/{id}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
    /// Display name; falls back to the caller's email local-part.
    #[serde(default)]
    pub author: Option<String>,
}

/// Query of `GET /api/news`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    /// Only posts owned by this uid ("my posts").
    #[serde(default)]
    pub author_id: Option<String>,
}

/// Query of `GET /api/users/{userId}/audit-log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: usize,
}

fn default_audit_limit() -> usize {
    50
}

/// `PUT /api/users/{userId}/settings/currency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyRequest {
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp,
        }
    }
}

/// Query of `POST /api/notifications/upload`; the file itself arrives as
/// a multipart form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
    pub bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

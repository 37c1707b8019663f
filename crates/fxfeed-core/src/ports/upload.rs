//! Binary asset hosting port (post images, KYC scans).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// File handed to the asset host.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Optional folder on the asset host.
    pub folder: Option<String>,
}

/// Where the asset ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub format: Option<String>,
}

#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedAsset, UploadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Uploads are not configured")]
    NotConfigured,

    #[error("Rejected upload: {0}")]
    Rejected(String),

    #[error("Asset host error: {0}")]
    Upstream(String),
}

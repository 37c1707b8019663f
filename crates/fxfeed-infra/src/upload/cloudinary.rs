//! Cloudinary unsigned uploads (post images, KYC scans).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use fxfeed_core::ports::{AssetUploader, UploadError, UploadRequest, UploadedAsset};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    /// Unsigned upload preset configured in the Cloudinary console.
    pub upload_preset: String,
    pub max_bytes: usize,
}

impl CloudinaryConfig {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            max_bytes: 10 * 1024 * 1024,
        }
    }

    /// `None` unless both the cloud name and preset are set, directly or via
    /// the mobile app's `EXPO_PUBLIC_` variables.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .or_else(|_| std::env::var(format!("EXPO_PUBLIC_{name}")))
                .ok()
                .filter(|v| !v.trim().is_empty())
        };
        Some(Self::new(
            var("CLOUDINARY_CLOUD_NAME")?,
            var("CLOUDINARY_UPLOAD_PRESET")?,
        ))
    }

    fn upload_url(&self) -> String {
        format!("{API_BASE}/{}/auto/upload", self.cloud_name)
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct CloudinaryUploader {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| UploadError::Upstream(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn check(&self, request: &UploadRequest) -> Result<(), UploadError> {
        if request.bytes.is_empty() {
            return Err(UploadError::Rejected("file is empty".to_string()));
        }
        if request.bytes.len() > self.config.max_bytes {
            return Err(UploadError::Rejected(format!(
                "file exceeds {} bytes",
                self.config.max_bytes
            )));
        }
        if request.filename.trim().is_empty() {
            return Err(UploadError::Rejected("filename is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetUploader for CloudinaryUploader {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedAsset, UploadError> {
        self.check(&request)?;
        let size = request.bytes.len();

        let file = Part::bytes(request.bytes)
            .file_name(request.filename.clone())
            .mime_str(&request.content_type)
            .map_err(|e| UploadError::Rejected(format!("invalid content type: {e}")))?;
        let mut form = Form::new()
            .part("file", file)
            .text("upload_preset", self.config.upload_preset.clone());
        if let Some(folder) = request.folder {
            form = form.text("folder", folder);
        }

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), %message, "Cloudinary rejected upload");
            return Err(if status.is_client_error() {
                UploadError::Rejected(message)
            } else {
                UploadError::Upstream(message)
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Upstream(e.to_string()))?;
        tracing::info!(
            public_id = %uploaded.public_id,
            bytes = size,
            filename = %request.filename,
            "Asset uploaded"
        );

        Ok(UploadedAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            bytes: uploaded.bytes,
            format: uploaded.format,
        })
    }
}

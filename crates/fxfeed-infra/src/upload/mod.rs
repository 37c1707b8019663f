//! Asset hosting.

#[cfg(feature = "uploads")]
mod cloudinary;

use async_trait::async_trait;
use fxfeed_core::ports::{AssetUploader, UploadError, UploadRequest, UploadedAsset};

#[cfg(feature = "uploads")]
pub use cloudinary::{CloudinaryConfig, CloudinaryUploader};

/// Stand-in used when no asset host is configured.
pub struct DisabledUploader;

#[async_trait]
impl AssetUploader for DisabledUploader {
    async fn upload(&self, _request: UploadRequest) -> Result<UploadedAsset, UploadError> {
        Err(UploadError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_uploader() {
        let request = UploadRequest {
            filename: "passport.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: b"ok".to_vec(),
            folder: None,
        };
        assert!(matches!(
            DisabledUploader.upload(request).await,
            Err(UploadError::NotConfigured)
        ));
    }
}

//! Application state - shared across all handlers.

use std::sync::Arc;

use fxfeed_core::ports::{AssetUploader, RemoteStore, TokenService};
use fxfeed_core::services::{MenuService, NewsService, NotificationService, ProfileService};
use fxfeed_infra::{DisabledUploader, InMemoryStore, JwtTokenService};

#[cfg(feature = "rate-limit")]
use fxfeed_core::ports::RateLimiter;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsService>,
    pub profiles: Arc<ProfileService>,
    pub menu: Arc<MenuService>,
    pub notifications: Arc<NotificationService>,
    pub tokens: Arc<dyn TokenService>,
    pub uploader: Arc<dyn AssetUploader>,
    #[cfg(feature = "rate-limit")]
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub skip_admin_check: bool,
}

impl AppState {
    /// Build the state with the backends the configuration asks for,
    /// falling back to in-process ones when a backend is unavailable.
    pub fn new(config: &AppConfig) -> Self {
        let store = Self::store(config);
        let mut state = Self::with_store(store, Arc::new(JwtTokenService::new(config.jwt.clone())));
        state.uploader = Self::uploader(config);
        state.skip_admin_check = config.skip_admin_check;

        #[cfg(feature = "rate-limit")]
        {
            state.rate_limiter = match fxfeed_infra::InMemoryRateLimiter::new(config.rate_limit.clone()) {
                Ok(limiter) => Some(Arc::new(limiter)),
                Err(e) => {
                    tracing::error!(error = %e, "Invalid rate limit settings; rate limiting disabled");
                    None
                }
            };
        }

        if config.skip_admin_check {
            tracing::warn!("SKIP_ADMIN_CHECK is set: any signed-in user may review KYC");
        }
        tracing::info!("Application state initialized");
        state
    }

    /// Services over `store`, with uploads and throttling off. Tests start here.
    pub fn with_store(store: Arc<dyn RemoteStore>, tokens: Arc<dyn TokenService>) -> Self {
        let notifications = Arc::new(NotificationService::new(store.clone()));
        Self {
            news: Arc::new(NewsService::new(store.clone())),
            profiles: Arc::new(ProfileService::new(store.clone())),
            menu: Arc::new(MenuService::new(store, notifications.clone())),
            notifications,
            tokens,
            uploader: Arc::new(DisabledUploader),
            #[cfg(feature = "rate-limit")]
            rate_limiter: None,
            skip_admin_check: false,
        }
    }

    fn store(config: &AppConfig) -> Arc<dyn RemoteStore> {
        #[cfg(feature = "firebase")]
        {
            if let Some(firebase) = &config.firebase {
                match fxfeed_infra::FirebaseStore::new(firebase.clone()) {
                    Ok(store) => {
                        tracing::info!("Using Firebase Realtime Database");
                        return Arc::new(store);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to set up Firebase store. Using in-memory fallback.");
                    }
                }
            } else {
                tracing::warn!("FIREBASE_DATABASE_URL not set. Running on the in-memory store.");
            }
        }

        #[cfg(not(feature = "firebase"))]
        {
            let _ = config;
            tracing::info!("Running without firebase feature - using in-memory store");
        }

        Arc::new(InMemoryStore::new())
    }

    fn uploader(config: &AppConfig) -> Arc<dyn AssetUploader> {
        #[cfg(feature = "uploads")]
        {
            if let Some(cloudinary) = &config.cloudinary {
                match fxfeed_infra::CloudinaryUploader::new(cloudinary.clone()) {
                    Ok(uploader) => return Arc::new(uploader),
                    Err(e) => tracing::error!(error = %e, "Failed to set up Cloudinary uploads"),
                }
            } else {
                tracing::warn!("Cloudinary not configured. Uploads are disabled.");
            }
        }

        #[cfg(not(feature = "uploads"))]
        let _ = config;

        Arc::new(DisabledUploader)
    }
}

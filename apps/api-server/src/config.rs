//! Application configuration loaded from environment variables.

use std::env;

use fxfeed_infra::JwtConfig;

#[cfg(feature = "firebase")]
use fxfeed_infra::FirebaseConfig;

#[cfg(feature = "uploads")]
use fxfeed_infra::CloudinaryConfig;

#[cfg(feature = "rate-limit")]
use fxfeed_infra::RateLimitConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `APP_ENV`; `development` adds error chains to responses.
    pub environment: String,
    /// Lets any signed-in user review KYC submissions. Test deployments only.
    pub skip_admin_check: bool,
    pub jwt: JwtConfig,
    #[cfg(feature = "firebase")]
    pub firebase: Option<FirebaseConfig>,
    #[cfg(feature = "uploads")]
    pub cloudinary: Option<CloudinaryConfig>,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            skip_admin_check: env::var("SKIP_ADMIN_CHECK")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            jwt: JwtConfig::from_env(),
            #[cfg(feature = "firebase")]
            firebase: FirebaseConfig::from_env(),
            #[cfg(feature = "uploads")]
            cloudinary: CloudinaryConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev")
    }
}

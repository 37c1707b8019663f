//! # Fxfeed Infrastructure
//!
//! Concrete implementations of the ports defined in `fxfeed-core`: the
//! Firebase store backend, bearer-token verification, rate limiting and
//! asset uploads.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store only
//! - `firebase` - Firebase Realtime Database REST/streaming backend
//! - `uploads` - Cloudinary uploads
//! - `auth` - HS256 JWT verification
//! - `rate-limit` - Rate limiting via governor

pub mod store;

pub mod upload;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use store::InMemoryStore;

#[cfg(feature = "firebase")]
pub use store::{FirebaseConfig, FirebaseStore};

pub use upload::DisabledUploader;

#[cfg(feature = "uploads")]
pub use upload::{CloudinaryConfig, CloudinaryUploader};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

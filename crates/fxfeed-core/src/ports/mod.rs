//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
pub mod store;
mod upload;

pub use auth::{ADMIN_ROLE, AuthError, TokenClaims, TokenService};
pub use rate_limit::{RateLimitDecision, RateLimitError, RateLimiter};
pub use store::{RemoteStore, StoreWatch, TransactionFn};
pub use upload::{AssetUploader, UploadError, UploadRequest, UploadedAsset};

//! # Fxfeed Core
//!
//! The domain layer: feed posts, trader profiles, KYC, settings and
//! notifications, plus the services that read and write them through the
//! [`ports::RemoteStore`] port. No network code lives here.

pub mod domain;
pub mod error;
pub mod paths;
pub mod ports;
pub mod services;
pub mod store;

pub use error::{DomainError, StoreError};

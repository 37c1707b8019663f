//! Remote store backends. The in-process tree lives in `fxfeed-core`.

#[cfg(feature = "firebase")]
mod firebase;
#[cfg(feature = "firebase")]
mod sse;

#[cfg(feature = "firebase")]
pub use firebase::{FirebaseConfig, FirebaseStore};

pub use fxfeed_core::store::InMemoryStore;

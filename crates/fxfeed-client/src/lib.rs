//! # Fxfeed Client
//!
//! What the mobile screens bind to: cached state slices, the feed
//! controller with optimistic likes, the live notifications list and the
//! sign-in driven profile bootstrap. Everything talks to the remote store
//! through the `fxfeed-core` services; nothing here owns a global.

pub mod auth_messages;
pub mod bootstrap;
pub mod feed;
pub mod news_slice;
pub mod notifications;
pub mod state;
pub mod user_slice;

pub use auth_messages::auth_error_message;
pub use bootstrap::{AuthUser, BootstrapPhase, ProfileBootstrap};
pub use feed::{Detail, FeedController, Outcome, Toast, ToastKind, Viewer};
pub use news_slice::{NewsAction, NewsPatch, NewsState};
pub use notifications::NotificationsFeed;
pub use state::{Reducer, StateHandle};
pub use user_slice::{ProfileAction, UserProfileState};

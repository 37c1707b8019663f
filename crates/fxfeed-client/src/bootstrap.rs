//! Populates the cached profile once per sign-in.
//!
//! `SignedOut -> Loading -> Loaded | LoadedWithFallback`, and back to
//! `SignedOut` on sign-out. Load failures never surface: the state still
//! ends up loaded, with zeroed stats and a name taken from the email.

use std::sync::Arc;

use fxfeed_core::domain::{DEFAULT_AVATAR_URL, TradingStats, display_name_from_email};
use fxfeed_core::services::ProfileService;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::StateHandle;
use crate::user_slice::{ProfileAction, UserProfileState};

/// Identity reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapPhase {
    SignedOut,
    Loading { uid: String },
    Loaded { uid: String },
    LoadedWithFallback { uid: String },
}

impl BootstrapPhase {
    fn uid(&self) -> Option<&str> {
        match self {
            BootstrapPhase::SignedOut => None,
            BootstrapPhase::Loading { uid }
            | BootstrapPhase::Loaded { uid }
            | BootstrapPhase::LoadedWithFallback { uid } => Some(uid),
        }
    }
}

pub struct ProfileBootstrap {
    profiles: Arc<ProfileService>,
    state: StateHandle<UserProfileState>,
    phase: watch::Sender<BootstrapPhase>,
}

impl ProfileBootstrap {
    pub fn new(profiles: Arc<ProfileService>, state: StateHandle<UserProfileState>) -> Self {
        Self {
            profiles,
            state,
            phase: watch::channel(BootstrapPhase::SignedOut).0,
        }
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phase.borrow().clone()
    }

    pub fn watch_phase(&self) -> watch::Receiver<BootstrapPhase> {
        self.phase.subscribe()
    }

    /// Follow the auth state until its sender goes away.
    pub fn spawn(self: Arc<Self>, auth: watch::Receiver<Option<AuthUser>>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(auth).await })
    }

    pub async fn run(&self, mut auth: watch::Receiver<Option<AuthUser>>) {
        loop {
            let user = auth.borrow_and_update().clone();
            self.on_auth_change(user).await;
            if auth.changed().await.is_err() {
                break;
            }
        }
    }

    /// React to one auth state. Repeated notifications for the user who is
    /// already loaded are ignored.
    pub async fn on_auth_change(&self, user: Option<AuthUser>) -> BootstrapPhase {
        let Some(user) = user else {
            self.state.dispatch(ProfileAction::ClearProfile);
            self.phase.send_replace(BootstrapPhase::SignedOut);
            return BootstrapPhase::SignedOut;
        };

        let current = self.phase();
        if current.uid() == Some(user.uid.as_str()) {
            return current;
        }

        self.phase.send_replace(BootstrapPhase::Loading {
            uid: user.uid.clone(),
        });
        let phase = self.load(&user).await;
        self.phase.send_replace(phase.clone());
        phase
    }

    async fn load(&self, user: &AuthUser) -> BootstrapPhase {
        let (profile, stats) = tokio::join!(
            self.profiles.ensure_profile(&user.uid, &user.email),
            self.profiles.get_stats(&user.uid),
        );

        let mut fell_back = false;
        let (name, avatar) = match profile {
            Ok(profile) => {
                let avatar = if profile.avatar.trim().is_empty() {
                    DEFAULT_AVATAR_URL.to_string()
                } else {
                    profile.avatar
                };
                (profile.name, avatar)
            }
            Err(e) => {
                tracing::warn!(user_id = %user.uid, error = %e, "Profile load failed; using fallback");
                fell_back = true;
                (
                    display_name_from_email(&user.email),
                    DEFAULT_AVATAR_URL.to_string(),
                )
            }
        };
        let stats = stats.unwrap_or_else(|e| {
            tracing::warn!(user_id = %user.uid, error = %e, "Stats load failed; using zeros");
            fell_back = true;
            TradingStats::default()
        });

        self.state.dispatch(ProfileAction::SetProfile {
            user_id: user.uid.clone(),
            name,
            email: user.email.clone(),
            avatar,
        });
        self.state.dispatch(ProfileAction::SetStats(stats));

        let uid = user.uid.clone();
        if fell_back {
            BootstrapPhase::LoadedWithFallback { uid }
        } else {
            BootstrapPhase::Loaded { uid }
        }
    }
}

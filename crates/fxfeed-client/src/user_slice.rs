//! Signed-in user's cached profile.

use fxfeed_core::domain::{DEFAULT_AVATAR_URL, TradingStats};

use crate::state::Reducer;

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfileState {
    pub user_id: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub avatar_uri: String,
    pub user_stats: TradingStats,
    pub profile_loaded: bool,
}

impl Default for UserProfileState {
    fn default() -> Self {
        Self {
            user_id: None,
            user_name: String::new(),
            user_email: String::new(),
            avatar_uri: DEFAULT_AVATAR_URL.to_string(),
            user_stats: TradingStats::default(),
            profile_loaded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileAction {
    SetProfile {
        user_id: String,
        name: String,
        email: String,
        avatar: String,
    },
    SetStats(TradingStats),
    SetAvatar(String),
    ClearProfile,
}

impl Reducer for UserProfileState {
    type Action = ProfileAction;

    fn reduce(&mut self, action: ProfileAction) {
        match action {
            ProfileAction::SetProfile {
                user_id,
                name,
                email,
                avatar,
            } => {
                self.user_id = Some(user_id);
                self.user_name = name;
                self.user_email = email;
                self.avatar_uri = avatar;
                self.profile_loaded = true;
            }
            ProfileAction::SetStats(stats) => self.user_stats = stats,
            ProfileAction::SetAvatar(uri) => self.avatar_uri = uri,
            ProfileAction::ClearProfile => *self = Self::default(),
        }
    }
}

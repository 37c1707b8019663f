//! Domain entities - the core business objects and their typed inputs.

mod kyc;
mod news;
mod notification;
mod profile;
mod trade;
mod validate;

pub use kyc::{KycDecision, KycDocument, KycRecord, KycStatus, validate_documents};
pub use news::{
    Comment, CommentDraft, DEFAULT_AUTHOR, DEFAULT_CATEGORY, MAX_COMMENT_CHARS, MAX_CONTENT_CHARS,
    MAX_TITLE_CHARS, NewsDraft, NewsPost, NewsRecord, NewsUpdate,
};
pub use notification::{
    AuditEntry, Notification, NotificationDraft, NotificationKind, NotificationPreferences,
    NotificationPreferencesUpdate,
};
pub use profile::{
    DEFAULT_AVATAR_URL, DEFAULT_CURRENCY, FALLBACK_DISPLAY_NAME, ProfileUpdate, SettingKey,
    TradingStats, UserProfile, UserSettings, display_name_from_email, validate_currency,
};
pub use trade::{TradeDirection, TradeDraft, TradeRecord};

/// The caller on whose behalf a mutation runs, as verified by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            is_admin: false,
        }
    }

    pub fn admin(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            is_admin: true,
        }
    }

    /// May this actor act on resources owned by `owner`?
    pub fn can_act_for(&self, owner: &str) -> bool {
        self.is_admin || self.uid == owner
    }
}

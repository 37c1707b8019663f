use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::error::{DomainError, ValidationErrors};

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    System,
    Kyc,
    PriceAlert,
    TradeSignal,
    News,
}

/// Entry at `notifications/{uid}/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        validate::required(&mut errors, "title", &self.title);
        validate::max_chars(&mut errors, "title", &self.title, 120);
        errors.into_result()
    }
}

/// Which channels a user wants alerts on, at
/// `users/{uid}/notificationPreferences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub push: bool,
    pub email: bool,
    pub price_alerts: bool,
    pub trade_signals: bool,
    pub news_updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push: true,
            email: false,
            price_alerts: true,
            trade_signals: true,
            news_updates: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationPreferencesUpdate {
    pub push: Option<bool>,
    pub email: Option<bool>,
    pub price_alerts: Option<bool>,
    pub trade_signals: Option<bool>,
    pub news_updates: Option<bool>,
}

impl NotificationPreferencesUpdate {
    pub fn apply(&self, prefs: &mut NotificationPreferences) {
        let pairs = [
            (self.push, &mut prefs.push),
            (self.email, &mut prefs.email),
            (self.price_alerts, &mut prefs.price_alerts),
            (self.trade_signals, &mut prefs.trade_signals),
            (self.news_updates, &mut prefs.news_updates),
        ];
        for (value, slot) in pairs {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Entry in `users/{uid}/auditLog`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: String,
    #[serde(default)]
    pub detail: String,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_partial_update() {
        let mut prefs = NotificationPreferences::default();
        NotificationPreferencesUpdate {
            email: Some(true),
            news_updates: Some(false),
            ..Default::default()
        }
        .apply(&mut prefs);

        assert!(prefs.email);
        assert!(!prefs.news_updates);
        assert!(prefs.push);
    }
}

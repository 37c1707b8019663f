use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kyc::KycRecord;
use super::validate;
use crate::error::{DomainError, ValidationErrors};

/// Avatar assigned to profiles created on first sign-in.
pub const DEFAULT_AVATAR_URL: &str = "https://ui-avatars.com/api/?name=Trader&background=0D8ABC&color=fff";

/// Display name used when an email has no usable local part.
pub const FALLBACK_DISPLAY_NAME: &str = "Trader";

pub const DEFAULT_CURRENCY: &str = "USD";

/// Derive a display name from an email address: its local part.
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default().trim();
    if local.is_empty() {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        local.to_string()
    }
}

/// Trading performance summary at `users/{uid}/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingStats {
    pub balance: f64,
    pub profit: f64,
    pub win_rate: f64,
    pub total_trades: u64,
    pub winning_trades: u64,
}

impl TradingStats {
    /// Fold a closed trade's profit into the totals.
    pub fn record(&mut self, profit: f64) {
        self.total_trades += 1;
        if profit > 0.0 {
            self.winning_trades += 1;
        }
        self.profit += profit;
        self.balance += profit;
        self.win_rate = self.winning_trades as f64 / self.total_trades as f64 * 100.0;
    }
}

/// Account settings at `users/{uid}/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub biometric: bool,
    pub two_factor: bool,
    pub currency: String,
    pub notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            biometric: false,
            two_factor: false,
            currency: DEFAULT_CURRENCY.to_string(),
            notifications: true,
        }
    }
}

/// The boolean switches on the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    Biometric,
    TwoFactor,
    Notifications,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Biometric => "biometric",
            SettingKey::TwoFactor => "twoFactor",
            SettingKey::Notifications => "notifications",
        }
    }
}

impl std::str::FromStr for SettingKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [SettingKey::Biometric, SettingKey::TwoFactor, SettingKey::Notifications]
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::invalid("key", format!("unknown setting '{s}'")))
    }
}

impl UserSettings {
    pub fn flip(&mut self, key: SettingKey) -> bool {
        let slot = match key {
            SettingKey::Biometric => &mut self.biometric,
            SettingKey::TwoFactor => &mut self.two_factor,
            SettingKey::Notifications => &mut self.notifications,
        };
        *slot = !*slot;
        *slot
    }
}

/// Currency codes are three uppercase ASCII letters.
pub fn validate_currency(code: &str) -> Result<(), DomainError> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(DomainError::invalid("currency", "must be a three-letter ISO code"))
    }
}

/// Profile document at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: TradingStats,
    #[serde(default)]
    pub settings: UserSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc: Option<KycRecord>,
}

impl UserProfile {
    /// Profile created lazily on first sign-in.
    pub fn first_sign_in(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: display_name_from_email(email),
            email: email.to_string(),
            avatar: DEFAULT_AVATAR_URL.to_string(),
            created_at: now,
            stats: TradingStats::default(),
            settings: UserSettings::default(),
            kyc: None,
        }
    }
}

/// Partial profile edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        if self.name.is_none() && self.avatar.is_none() {
            errors.push("update", "at least one field must be supplied");
        }
        if let Some(name) = &self.name {
            validate::required(&mut errors, "name", name);
            validate::max_chars(&mut errors, "name", name, 80);
        }
        if let Some(avatar) = &self.avatar {
            validate::optional_url(&mut errors, "avatar", avatar);
        }
        errors.into_result()
    }

    /// The supplied fields only, as children of `users/{uid}`.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".into(), Value::String(name.trim().to_string()));
        }
        if let Some(avatar) = &self.avatar {
            fields.insert("avatar".into(), Value::String(avatar.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_email() {
        assert_eq!(display_name_from_email("alice.smith@example.com"), "alice.smith");
        assert_eq!(display_name_from_email("@example.com"), "Trader");
        assert_eq!(display_name_from_email(""), "Trader");
    }

    #[test]
    fn test_stats_record() {
        let mut stats = TradingStats::default();
        stats.record(25.0);
        stats.record(-10.0);

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.profit, 15.0);
        assert_eq!(stats.balance, 15.0);
        assert_eq!(stats.win_rate, 50.0);
    }

    #[test]
    fn test_flip_setting() {
        let mut settings = UserSettings::default();
        assert!(settings.flip(SettingKey::TwoFactor));
        assert!(!settings.flip(SettingKey::TwoFactor));
        assert!(!settings.flip(SettingKey::Notifications));
    }

    #[test]
    fn test_setting_key_from_str() {
        assert_eq!("twoFactor".parse::<SettingKey>().unwrap(), SettingKey::TwoFactor);
        assert!("two_factor".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_currency_validation() {
        assert!(validate_currency("EUR").is_ok());
        assert!(validate_currency("eur").is_err());
        assert!(validate_currency("EURO").is_err());
    }
}

//! Account menu: settings switches, KYC submissions, notification
//! preferences and the per-user audit log.

use std::sync::Arc;

use chrono::Utc;

use super::{NotificationService, decode_children, newest_first, read, transact};
use crate::domain::{
    AuditEntry, KycDecision, KycDocument, KycRecord, KycStatus, NotificationDraft, NotificationKind,
    NotificationPreferences, NotificationPreferencesUpdate, SettingKey, UserSettings,
    validate_currency, validate_documents,
};
use crate::error::DomainError;
use crate::paths;
use crate::ports::RemoteStore;

const KYC_ENTITY: &str = "KYC record";

pub struct MenuService {
    store: Arc<dyn RemoteStore>,
    notifications: Arc<NotificationService>,
}

impl MenuService {
    pub fn new(store: Arc<dyn RemoteStore>, notifications: Arc<NotificationService>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    // --- settings ---

    pub async fn get_settings(&self, uid: &str) -> Result<UserSettings, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        Ok(read(self.store.as_ref(), &paths::settings(uid))
            .await?
            .unwrap_or_default())
    }

    /// Flip one switch and log it.
    pub async fn toggle_setting(&self, uid: &str, key: SettingKey) -> Result<UserSettings, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let settings = transact(
            self.store.as_ref(),
            &paths::settings(uid),
            |current: Option<UserSettings>| {
                let mut settings = current.unwrap_or_default();
                settings.flip(key);
                Ok(settings)
            },
        )
        .await?;

        let enabled = match key {
            SettingKey::Biometric => settings.biometric,
            SettingKey::TwoFactor => settings.two_factor,
            SettingKey::Notifications => settings.notifications,
        };
        self.append_audit_entry(
            uid,
            "settings.toggled",
            &format!("{} {}", key.as_str(), if enabled { "enabled" } else { "disabled" }),
        )
        .await?;
        Ok(settings)
    }

    pub async fn set_currency(&self, uid: &str, code: &str) -> Result<UserSettings, DomainError> {
        validate_currency(code)?;
        let uid = paths::check_key("userId", uid)?;
        let settings = transact(
            self.store.as_ref(),
            &paths::settings(uid),
            |current: Option<UserSettings>| {
                let mut settings = current.unwrap_or_default();
                settings.currency = code.to_string();
                Ok(settings)
            },
        )
        .await?;

        self.append_audit_entry(uid, "settings.currency", code).await?;
        Ok(settings)
    }

    // --- audit log ---

    pub async fn append_audit_entry(
        &self,
        uid: &str,
        action: &str,
        detail: &str,
    ) -> Result<AuditEntry, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let entry = AuditEntry {
            action: action.to_string(),
            detail: detail.to_string(),
            at: Utc::now(),
        };
        self.store
            .push(&paths::audit_log(uid), serde_json::to_value(&entry)?)
            .await?;
        tracing::debug!(user_id = %uid, action, "Audit entry appended");
        Ok(entry)
    }

    /// Most recent `limit` entries, newest first.
    pub async fn get_audit_log(&self, uid: &str, limit: usize) -> Result<Vec<AuditEntry>, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let log = self.store.get(&paths::audit_log(uid)).await?;
        Ok(newest_first(decode_children::<AuditEntry>(log, "AuditEntry"))
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry)
            .collect())
    }

    // --- KYC ---

    pub async fn get_kyc(&self, uid: &str) -> Result<Option<KycRecord>, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        read(self.store.as_ref(), &paths::kyc(uid)).await
    }

    /// Submit documents for review. Allowed for first-time submitters and
    /// after a rejection.
    pub async fn submit_kyc(
        &self,
        uid: &str,
        documents: Vec<KycDocument>,
    ) -> Result<KycRecord, DomainError> {
        validate_documents(&documents)?;
        let uid = paths::check_key("userId", uid)?;
        let now = Utc::now();

        let record = transact(self.store.as_ref(), &paths::kyc(uid), |current: Option<KycRecord>| {
            let status = current.map(|r| r.status).unwrap_or_default();
            if !status.accepts_submission() {
                return Err(DomainError::Conflict(match status {
                    KycStatus::Approved => "identity is already verified".to_string(),
                    _ => "a submission is already pending review".to_string(),
                }));
            }
            Ok(KycRecord::submitted(documents.clone(), now))
        })
        .await?;

        tracing::info!(user_id = %uid, documents = record.documents.len(), "KYC submitted");
        self.append_audit_entry(
            uid,
            "kyc.submitted",
            &format!("{} document(s)", record.documents.len()),
        )
        .await?;
        Ok(record)
    }

    /// Record a reviewer's decision on a pending submission and tell the user.
    pub async fn set_kyc_status(
        &self,
        uid: &str,
        decision: KycDecision,
    ) -> Result<KycRecord, DomainError> {
        decision.validate()?;
        let uid = paths::check_key("userId", uid)?;
        let now = Utc::now();

        let record = transact(self.store.as_ref(), &paths::kyc(uid), |current: Option<KycRecord>| {
            let mut record = current
                .filter(|r| r.status != KycStatus::NotSubmitted)
                .ok_or_else(|| DomainError::not_found(KYC_ENTITY, uid))?;
            if record.status != KycStatus::Pending {
                return Err(DomainError::Conflict(
                    "KYC record is not pending review".to_string(),
                ));
            }
            record.apply(&decision, now);
            Ok(record)
        })
        .await?;

        let (action, draft) = match &decision {
            KycDecision::Approve => (
                "kyc.approved",
                NotificationDraft::new(
                    NotificationKind::Kyc,
                    "Identity verified",
                    "Your documents were approved. All features are unlocked.",
                ),
            ),
            KycDecision::Reject { reason } => (
                "kyc.rejected",
                NotificationDraft::new(
                    NotificationKind::Kyc,
                    "Identity verification rejected",
                    format!("Reason: {reason}. You can submit new documents."),
                ),
            ),
        };
        tracing::info!(user_id = %uid, status = ?record.status, "KYC reviewed");

        self.append_audit_entry(uid, action, record.rejection_reason.as_deref().unwrap_or(""))
            .await?;
        // The decision is committed; a failed alert must not undo it.
        if let Err(e) = self.notifications.notify(uid, draft).await {
            tracing::warn!(user_id = %uid, error = %e, "Failed to send KYC notification");
        }
        Ok(record)
    }

    // --- notification preferences ---

    pub async fn get_notification_preferences(
        &self,
        uid: &str,
    ) -> Result<NotificationPreferences, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        Ok(read(self.store.as_ref(), &paths::notification_preferences(uid))
            .await?
            .unwrap_or_default())
    }

    pub async fn update_notification_preferences(
        &self,
        uid: &str,
        update: NotificationPreferencesUpdate,
    ) -> Result<NotificationPreferences, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        transact(
            self.store.as_ref(),
            &paths::notification_preferences(uid),
            |current: Option<NotificationPreferences>| {
                let mut prefs = current.unwrap_or_default();
                update.apply(&mut prefs);
                Ok(prefs)
            },
        )
        .await
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::error::{DomainError, ValidationErrors};

/// Verification state of a user's identity documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    /// Whether a fresh submission is accepted from this state.
    pub fn accepts_submission(self) -> bool {
        matches!(self, KycStatus::NotSubmitted | KycStatus::Rejected)
    }
}

/// An uploaded identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycDocument {
    /// e.g. `passport`, `id_card`, `proof_of_address`.
    pub kind: String,
    pub url: String,
}

/// Record at `users/{uid}/kyc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRecord {
    #[serde(default)]
    pub status: KycStatus,
    #[serde(default)]
    pub documents: Vec<KycDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl KycRecord {
    pub fn submitted(documents: Vec<KycDocument>, now: DateTime<Utc>) -> Self {
        Self {
            status: KycStatus::Pending,
            documents,
            submitted_at: Some(now),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, decision: &KycDecision, now: DateTime<Utc>) {
        self.reviewed_at = Some(now);
        match decision {
            KycDecision::Approve => {
                self.status = KycStatus::Approved;
                self.approved_at = Some(now);
                self.rejection_reason = None;
            }
            KycDecision::Reject { reason } => {
                self.status = KycStatus::Rejected;
                self.approved_at = None;
                self.rejection_reason = Some(reason.trim().to_string());
            }
        }
    }
}

pub fn validate_documents(documents: &[KycDocument]) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::default();
    if documents.is_empty() {
        errors.push("documents", "at least one document is required");
    }
    for doc in documents {
        validate::required(&mut errors, "documents.kind", &doc.kind);
        if !validate::is_http_url(&doc.url) {
            errors.push("documents.url", "must be an http(s) URL");
        }
    }
    errors.into_result()
}

/// Reviewer verdict on a pending submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KycDecision {
    #[serde(alias = "approved")]
    Approve,
    #[serde(alias = "rejected")]
    Reject { reason: String },
}

impl KycDecision {
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            KycDecision::Reject { reason } if reason.trim().is_empty() => {
                Err(DomainError::invalid("reason", "is required when rejecting"))
            }
            _ => Ok(()),
        }
    }
}

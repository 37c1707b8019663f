use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::error::{DomainError, ValidationErrors};

pub const DEFAULT_AUTHOR: &str = "User";
pub const DEFAULT_CATEGORY: &str = "General";
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 10_000;
pub const MAX_COMMENT_CHARS: usize = 2_000;

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A comment on a feed post. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Stored shape under `news/{id}`.
///
/// Every counter and collection defaults so that partially written or
/// legacy records still decode; the store drops empty maps and lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub title: String,
    pub content: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub liked_by: BTreeMap<String, bool>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl NewsRecord {
    /// Flip `user_id` in the like set and recount.
    pub fn toggle_like(&mut self, user_id: &str) {
        if self.liked_by.remove(user_id).is_none() {
            self.liked_by.insert(user_id.to_string(), true);
        }
        self.likes_count = self.liked_by.len() as u64;
    }
}

/// A feed post as handed to callers: the stored record plus its key and
/// derived counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub liked_by: BTreeMap<String, bool>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub comments_count: usize,
}

impl NewsPost {
    /// Build the caller-facing view. `likesCount` is recomputed from the
    /// like set rather than trusted.
    pub fn from_record(id: impl Into<String>, record: NewsRecord) -> Self {
        Self {
            id: id.into(),
            likes_count: record.liked_by.len() as u64,
            comments_count: record.comments.len(),
            title: record.title,
            content: record.content,
            author: record.author,
            author_id: record.author_id,
            category: record.category,
            image_url: record.image_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
            liked_by: record.liked_by,
            comments: record.comments,
        }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.liked_by.contains_key(user_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.author_id.as_deref() == Some(user_id)
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewsDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.author = Some(name.into());
        self.author_id = Some(user_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        validate::required(&mut errors, "title", &self.title);
        validate::max_chars(&mut errors, "title", &self.title, MAX_TITLE_CHARS);
        validate::required(&mut errors, "content", &self.content);
        validate::max_chars(&mut errors, "content", &self.content, MAX_CONTENT_CHARS);
        if let Some(url) = &self.image_url {
            validate::optional_url(&mut errors, "imageUrl", url);
        }
        errors.into_result()
    }

    /// Apply defaults and produce the record to store.
    pub fn into_record(self, now: DateTime<Utc>) -> NewsRecord {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        NewsRecord {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author: non_blank(self.author).unwrap_or_else(default_author),
            author_id: non_blank(self.author_id),
            category: non_blank(self.category).unwrap_or_else(default_category),
            image_url: self.image_url.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            likes_count: 0,
            liked_by: BTreeMap::new(),
            comments: Vec::new(),
        }
    }
}

/// Partial edit of a post. Only supplied fields are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewsUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        if self.is_empty() {
            errors.push("update", "at least one field must be supplied");
        }
        if let Some(title) = &self.title {
            validate::required(&mut errors, "title", title);
            validate::max_chars(&mut errors, "title", title, MAX_TITLE_CHARS);
        }
        if let Some(content) = &self.content {
            validate::required(&mut errors, "content", content);
            validate::max_chars(&mut errors, "content", content, MAX_CONTENT_CHARS);
        }
        if let Some(category) = &self.category {
            validate::required(&mut errors, "category", category);
        }
        if let Some(url) = &self.image_url {
            validate::optional_url(&mut errors, "imageUrl", url);
        }
        errors.into_result()
    }

    /// Shallow merge into `record`, stamping `updatedAt`.
    pub fn apply(&self, record: &mut NewsRecord, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(content) = &self.content {
            record.content = content.trim().to_string();
        }
        if let Some(category) = &self.category {
            record.category = category.trim().to_string();
        }
        if let Some(url) = &self.image_url {
            record.image_url = url.clone();
        }
        record.updated_at = now;
    }
}

/// Input for appending a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub author: String,
    #[serde(default)]
    pub author_id: Option<String>,
    pub text: String,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        validate::required(&mut errors, "author", &self.author);
        validate::required(&mut errors, "text", &self.text);
        validate::max_chars(&mut errors, "text", &self.text, MAX_COMMENT_CHARS);
        errors.into_result()
    }

    pub fn into_comment(self, now: DateTime<Utc>) -> Comment {
        Comment {
            author: self.author.trim().to_string(),
            author_id: self.author_id,
            text: self.text.trim().to_string(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_defaults() {
        let now = Utc::now();
        let record = NewsDraft::new("CPI Release", "Inflation cooled").into_record(now);

        assert_eq!(record.author, "User");
        assert_eq!(record.category, "General");
        assert_eq!(record.image_url, "");
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.likes_count, 0);
        assert!(record.liked_by.is_empty());
        assert!(record.comments.is_empty());
    }

    #[test]
    fn test_draft_requires_title_and_content() {
        let err = NewsDraft::new("  ", "").validate().unwrap_err();
        match err {
            DomainError::Validation(errors) => {
                assert_eq!(errors.message_for("title"), Some("is required"));
                assert_eq!(errors.message_for("content"), Some("is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let result: Result<NewsUpdate, _> =
            serde_json::from_value(json!({ "title": "x", "likesCount": 99 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_update_is_invalid() {
        assert!(NewsUpdate::default().validate().is_err());
    }

    #[test]
    fn test_record_decodes_with_missing_counters() {
        let record: NewsRecord = serde_json::from_value(json!({
            "title": "Fed holds",
            "content": "Rates unchanged",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        let post = NewsPost::from_record("k1", record);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
        assert_eq!(post.author, "User");
    }

    #[test]
    fn test_likes_count_recomputed_from_set() {
        let mut record = NewsDraft::new("t", "c").into_record(Utc::now());
        record.likes_count = 7;
        record.liked_by.insert("bob".into(), true);

        let post = NewsPost::from_record("k1", record);
        assert_eq!(post.likes_count, 1);
    }

    #[test]
    fn test_toggle_like_twice_restores() {
        let mut record = NewsDraft::new("t", "c").into_record(Utc::now());
        record.toggle_like("bob");
        assert_eq!(record.likes_count, 1);
        record.toggle_like("bob");
        assert_eq!(record.likes_count, 0);
        assert!(record.liked_by.is_empty());
    }
}

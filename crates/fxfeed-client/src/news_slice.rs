//! Cached feed list.
//!
//! The cache never revalidates on its own; screens refresh it explicitly
//! (on focus, pull-to-refresh) through the feed controller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fxfeed_core::domain::{Comment, NewsPost};

use crate::state::Reducer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsState {
    pub list: Vec<NewsPost>,
    pub loading: bool,
    pub error: Option<String>,
}

impl NewsState {
    pub fn get(&self, id: &str) -> Option<&NewsPost> {
        self.list.iter().find(|p| p.id == id)
    }
}

/// Partial replacement of one cached post, matched by `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsPatch {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub likes_count: Option<u64>,
    pub liked_by: Option<BTreeMap<String, bool>>,
    pub comments: Option<Vec<Comment>>,
}

impl NewsPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Patch that brings a cached copy in line with `post`.
    pub fn from_post(post: &NewsPost) -> Self {
        Self {
            id: post.id.clone(),
            title: Some(post.title.clone()),
            content: Some(post.content.clone()),
            category: Some(post.category.clone()),
            image_url: Some(post.image_url.clone()),
            updated_at: Some(post.updated_at),
            likes_count: Some(post.likes_count),
            liked_by: Some(post.liked_by.clone()),
            comments: Some(post.comments.clone()),
        }
    }

    /// Only the like fields of `post`.
    pub fn likes_of(post: &NewsPost) -> Self {
        Self {
            likes_count: Some(post.likes_count),
            liked_by: Some(post.liked_by.clone()),
            ..Self::new(post.id.clone())
        }
    }

    fn apply(self, post: &mut NewsPost) {
        if let Some(v) = self.title {
            post.title = v;
        }
        if let Some(v) = self.content {
            post.content = v;
        }
        if let Some(v) = self.category {
            post.category = v;
        }
        if let Some(v) = self.image_url {
            post.image_url = v;
        }
        if let Some(v) = self.updated_at {
            post.updated_at = v;
        }
        if let Some(v) = self.likes_count {
            post.likes_count = v;
        }
        if let Some(v) = self.liked_by {
            post.liked_by = v;
        }
        if let Some(v) = self.comments {
            post.comments_count = v.len();
            post.comments = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsAction {
    /// Replace the whole list; clears any earlier error.
    SetNewsList(Vec<NewsPost>),
    /// Prepend unless a post with the same id is already cached.
    AddNewsItem(NewsPost),
    /// Shallow merge; ignored when the id is not cached.
    UpdateNewsItem(NewsPatch),
    RemoveNewsItem(String),
    SetNewsLoading(bool),
    SetNewsError(Option<String>),
}

impl Reducer for NewsState {
    type Action = NewsAction;

    fn reduce(&mut self, action: NewsAction) {
        match action {
            NewsAction::SetNewsList(items) => {
                self.list = items;
                self.error = None;
            }
            NewsAction::AddNewsItem(item) => {
                if self.get(&item.id).is_none() {
                    self.list.insert(0, item);
                }
            }
            NewsAction::UpdateNewsItem(patch) => {
                if let Some(post) = self.list.iter_mut().find(|p| p.id == patch.id) {
                    patch.apply(post);
                }
            }
            NewsAction::RemoveNewsItem(id) => self.list.retain(|p| p.id != id),
            NewsAction::SetNewsLoading(loading) => self.loading = loading,
            NewsAction::SetNewsError(error) => self.error = error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxfeed_core::domain::{NewsDraft, NewsPost};

    fn post(id: &str, title: &str) -> NewsPost {
        NewsPost::from_record(id, NewsDraft::new(title, "body").into_record(Utc::now()))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::AddNewsItem(post("a", "first")));
        state.reduce(NewsAction::AddNewsItem(post("a", "first again")));

        assert_eq!(state.list.len(), 1);
        assert_eq!(state.list[0].title, "first");
    }

    #[test]
    fn test_add_prepends() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::SetNewsList(vec![post("a", "old")]));
        state.reduce(NewsAction::AddNewsItem(post("b", "new")));
        assert_eq!(state.list[0].id, "b");
    }

    #[test]
    fn test_set_list_clears_error() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::SetNewsError(Some("offline".into())));
        state.reduce(NewsAction::SetNewsList(Vec::new()));
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_update_merges_and_ignores_unknown_id() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::SetNewsList(vec![post("a", "old")]));

        state.reduce(NewsAction::UpdateNewsItem(NewsPatch {
            title: Some("new".into()),
            ..NewsPatch::new("a")
        }));
        let before = state.clone();
        state.reduce(NewsAction::UpdateNewsItem(NewsPatch {
            title: Some("ghost".into()),
            ..NewsPatch::new("missing")
        }));

        assert_eq!(state.list[0].title, "new");
        assert_eq!(state.list[0].content, "body");
        assert_eq!(state, before);
    }

    #[test]
    fn test_comments_patch_recounts() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::SetNewsList(vec![post("a", "t")]));
        let comment = Comment {
            author: "bob".into(),
            author_id: None,
            text: "nice".into(),
            created_at: Utc::now(),
        };
        state.reduce(NewsAction::UpdateNewsItem(NewsPatch {
            comments: Some(vec![comment]),
            ..NewsPatch::new("a")
        }));
        assert_eq!(state.list[0].comments_count, 1);
    }

    #[test]
    fn test_remove() {
        let mut state = NewsState::default();
        state.reduce(NewsAction::SetNewsList(vec![post("a", "t"), post("b", "u")]));
        state.reduce(NewsAction::RemoveNewsItem("a".into()));
        assert_eq!(state.list.len(), 1);
        assert_eq!(state.list[0].id, "b");
    }
}

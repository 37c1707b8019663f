//! Feed screen binding: reads and writes through [`NewsService`], keeps
//! the cached slice in step, and turns every failure into a toast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use fxfeed_core::DomainError;
use fxfeed_core::domain::{Actor, CommentDraft, NewsDraft, NewsPost, NewsUpdate};
use fxfeed_core::error::ValidationErrors;
use fxfeed_core::services::NewsService;

use crate::news_slice::{NewsAction, NewsPatch, NewsState};
use crate::state::StateHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Result of opening a post. A missing post is a screen state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Found(NewsPost),
    NotFound,
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// Rejected before any network call; shown inline next to the fields.
    Invalid(ValidationErrors),
    /// Reported through a toast.
    Failed,
}

/// The signed-in user as the feed sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub uid: String,
    pub name: String,
}

impl Viewer {
    fn actor(&self) -> Actor {
        Actor::user(self.uid.clone())
    }
}

fn toast_message(err: &DomainError) -> String {
    match err {
        DomainError::Validation(errors) => errors
            .fields()
            .first()
            .map(|e| format!("{} {}", e.field, e.message))
            .unwrap_or_else(|| err.to_string()),
        DomainError::Forbidden(_) => "You can only change your own posts".to_string(),
        DomainError::Store(_) => "Network error. Please try again.".to_string(),
        _ => err.to_string(),
    }
}

pub struct FeedController {
    news: Arc<NewsService>,
    state: StateHandle<NewsState>,
    viewer: Viewer,
    toasts: Mutex<VecDeque<Toast>>,
}

impl FeedController {
    pub fn new(news: Arc<NewsService>, state: StateHandle<NewsState>, viewer: Viewer) -> Self {
        Self {
            news,
            state,
            viewer,
            toasts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn state(&self) -> &StateHandle<NewsState> {
        &self.state
    }

    /// Drain pending toasts, oldest first.
    pub fn take_toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Toast {
                kind,
                message: message.into(),
            });
    }

    fn fail(&self, action: &'static str, err: &DomainError) {
        tracing::warn!(action, error = %err, "Feed action failed");
        self.toast(ToastKind::Error, toast_message(err));
    }

    /// Re-read the whole feed into the cache.
    pub async fn refresh(&self) {
        self.state.dispatch(NewsAction::SetNewsLoading(true));
        match self.news.get_news().await {
            Ok(list) => self.state.dispatch(NewsAction::SetNewsList(list)),
            Err(e) => {
                self.state
                    .dispatch(NewsAction::SetNewsError(Some(toast_message(&e))));
                self.fail("refresh", &e);
            }
        }
        self.state.dispatch(NewsAction::SetNewsLoading(false));
    }

    /// Load one post for the detail screen. `None` only when the read
    /// itself failed.
    pub async fn open(&self, id: &str) -> Option<Detail> {
        match self.news.get_news_by_id(id).await {
            Ok(Some(post)) => {
                self.state
                    .dispatch(NewsAction::UpdateNewsItem(NewsPatch::from_post(&post)));
                Some(Detail::Found(post))
            }
            Ok(None) => {
                self.state.dispatch(NewsAction::RemoveNewsItem(id.to_string()));
                Some(Detail::NotFound)
            }
            Err(e) => {
                self.fail("open", &e);
                None
            }
        }
    }

    pub async fn create(&self, draft: NewsDraft) -> Outcome<NewsPost> {
        let draft = draft.with_author(self.viewer.name.clone(), self.viewer.uid.clone());
        if let Err(DomainError::Validation(errors)) = draft.validate() {
            return Outcome::Invalid(errors);
        }

        match self.news.create_news(draft).await {
            Ok(post) => {
                self.state.dispatch(NewsAction::AddNewsItem(post.clone()));
                self.toast(ToastKind::Success, "Post published");
                Outcome::Done(post)
            }
            Err(e) => {
                self.fail("create", &e);
                Outcome::Failed
            }
        }
    }

    pub async fn edit(&self, id: &str, update: NewsUpdate) -> Outcome<NewsPost> {
        if let Err(DomainError::Validation(errors)) = update.validate() {
            return Outcome::Invalid(errors);
        }

        match self.news.update_news_as(id, update, &self.viewer.actor()).await {
            Ok(post) => {
                self.state
                    .dispatch(NewsAction::UpdateNewsItem(NewsPatch::from_post(&post)));
                self.toast(ToastKind::Success, "Post updated");
                Outcome::Done(post)
            }
            Err(e) => {
                self.fail("edit", &e);
                Outcome::Failed
            }
        }
    }

    /// Delete one of the viewer's own posts.
    pub async fn delete(&self, id: &str) -> bool {
        let foreign = self
            .state
            .read(|s| s.get(id).map(|p| !p.is_owned_by(&self.viewer.uid)))
            .unwrap_or(false);
        if foreign {
            self.toast(ToastKind::Error, "You can only delete your own posts");
            return false;
        }

        match self.news.delete_news_as(id, &self.viewer.actor()).await {
            Ok(()) => {
                self.state.dispatch(NewsAction::RemoveNewsItem(id.to_string()));
                self.toast(ToastKind::Success, "Post deleted");
                true
            }
            Err(e) => {
                self.fail("delete", &e);
                false
            }
        }
    }

    /// Flip the viewer's like. The cache changes first; the server result
    /// then replaces it, or the original counts come back on failure.
    pub async fn toggle_like(&self, id: &str) -> bool {
        let original = self.state.read(|s| s.get(id).cloned());

        if let Some(post) = &original {
            let mut liked_by = post.liked_by.clone();
            if liked_by.remove(&self.viewer.uid).is_none() {
                liked_by.insert(self.viewer.uid.clone(), true);
            }
            self.state.dispatch(NewsAction::UpdateNewsItem(NewsPatch {
                likes_count: Some(liked_by.len() as u64),
                liked_by: Some(liked_by),
                ..NewsPatch::new(id)
            }));
        }

        match self.news.like_news(id, &self.viewer.uid).await {
            Ok(post) => {
                self.state
                    .dispatch(NewsAction::UpdateNewsItem(NewsPatch::likes_of(&post)));
                true
            }
            Err(e) => {
                if let Some(post) = &original {
                    self.state
                        .dispatch(NewsAction::UpdateNewsItem(NewsPatch::likes_of(post)));
                }
                self.fail("like", &e);
                false
            }
        }
    }

    pub async fn comment(&self, id: &str, text: &str) -> Outcome<NewsPost> {
        let draft = CommentDraft {
            author: self.viewer.name.clone(),
            author_id: Some(self.viewer.uid.clone()),
            text: text.to_string(),
        };
        if let Err(DomainError::Validation(errors)) = draft.validate() {
            return Outcome::Invalid(errors);
        }

        match self.news.add_comment(id, draft).await {
            Ok(post) => {
                self.state.dispatch(NewsAction::UpdateNewsItem(NewsPatch {
                    comments: Some(post.comments.clone()),
                    ..NewsPatch::new(id)
                }));
                Outcome::Done(post)
            }
            Err(e) => {
                self.fail("comment", &e);
                Outcome::Failed
            }
        }
    }

    /// Posts owned by the viewer, newest first.
    pub async fn my_posts(&self) -> Vec<NewsPost> {
        match self.news.get_news_by_owner(&self.viewer.uid).await {
            Ok(posts) => posts,
            Err(e) => {
                self.fail("my_posts", &e);
                Vec::new()
            }
        }
    }
}

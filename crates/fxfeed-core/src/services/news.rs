//! Feed posts under `news/{id}`.

use std::sync::Arc;

use chrono::Utc;

use super::{decode_children, read, transact};
use crate::domain::{Actor, CommentDraft, NewsDraft, NewsPost, NewsRecord, NewsUpdate};
use crate::error::DomainError;
use crate::paths;
use crate::ports::RemoteStore;

const ENTITY: &str = "News";

pub struct NewsService {
    store: Arc<dyn RemoteStore>,
}

impl NewsService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Whole feed, newest first. An empty feed is an empty list.
    pub async fn get_news(&self) -> Result<Vec<NewsPost>, DomainError> {
        let collection = self.store.get(paths::NEWS).await?;
        let mut posts: Vec<NewsPost> = decode_children::<NewsRecord>(collection, ENTITY)
            .into_iter()
            .map(|(id, record)| NewsPost::from_record(id, record))
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!(count = posts.len(), "Loaded news feed");
        Ok(posts)
    }

    /// Posts whose recorded owner is `uid`.
    pub async fn get_news_by_owner(&self, uid: &str) -> Result<Vec<NewsPost>, DomainError> {
        let mut posts = self.get_news().await?;
        posts.retain(|p| p.is_owned_by(uid));
        Ok(posts)
    }

    /// `None` when the post does not exist.
    pub async fn get_news_by_id(&self, id: &str) -> Result<Option<NewsPost>, DomainError> {
        let id = paths::check_key("id", id)?;
        let record: Option<NewsRecord> = read(self.store.as_ref(), &paths::news(id)).await?;
        Ok(record.map(|r| NewsPost::from_record(id, r)))
    }

    pub async fn create_news(&self, draft: NewsDraft) -> Result<NewsPost, DomainError> {
        draft.validate()?;
        let record = draft.into_record(Utc::now());
        let id = self
            .store
            .push(paths::NEWS, serde_json::to_value(&record)?)
            .await?;

        tracing::info!(news_id = %id, author = %record.author, "News post created");
        Ok(NewsPost::from_record(id, record))
    }

    /// Shallow merge of the supplied fields. Fails with "News not found"
    /// without writing when the post is absent.
    pub async fn update_news(&self, id: &str, update: NewsUpdate) -> Result<NewsPost, DomainError> {
        self.apply_update(id, update, None).await
    }

    /// Like [`update_news`](Self::update_news), restricted to the post's owner.
    pub async fn update_news_as(
        &self,
        id: &str,
        update: NewsUpdate,
        actor: &Actor,
    ) -> Result<NewsPost, DomainError> {
        self.apply_update(id, update, Some(actor)).await
    }

    async fn apply_update(
        &self,
        id: &str,
        update: NewsUpdate,
        actor: Option<&Actor>,
    ) -> Result<NewsPost, DomainError> {
        update.validate()?;
        let id = paths::check_key("id", id)?;
        let now = Utc::now();

        let record = transact(self.store.as_ref(), &paths::news(id), |current: Option<NewsRecord>| {
            let mut record = current.ok_or_else(|| DomainError::not_found(ENTITY, id))?;
            if let Some(actor) = actor {
                ensure_owner(&record, actor)?;
            }
            update.apply(&mut record, now);
            Ok(record)
        })
        .await?;

        tracing::info!(news_id = %id, "News post updated");
        Ok(NewsPost::from_record(id, record))
    }

    /// Remove the post with its likes and comments.
    pub async fn delete_news(&self, id: &str) -> Result<(), DomainError> {
        self.remove(id, None).await
    }

    pub async fn delete_news_as(&self, id: &str, actor: &Actor) -> Result<(), DomainError> {
        self.remove(id, Some(actor)).await
    }

    async fn remove(&self, id: &str, actor: Option<&Actor>) -> Result<(), DomainError> {
        let id = paths::check_key("id", id)?;
        let path = paths::news(id);
        let record: NewsRecord = read(self.store.as_ref(), &path)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, id))?;
        if let Some(actor) = actor {
            ensure_owner(&record, actor)?;
        }

        self.store.remove(&path).await?;
        tracing::info!(news_id = %id, "News post deleted");
        Ok(())
    }

    /// Toggle `user_id`'s like. The set flip and the recount commit together,
    /// so concurrent likers never overwrite each other.
    pub async fn like_news(&self, id: &str, user_id: &str) -> Result<NewsPost, DomainError> {
        let id = paths::check_key("id", id)?;
        let user_id = paths::check_key("userId", user_id)?;

        let record = transact(self.store.as_ref(), &paths::news(id), |current: Option<NewsRecord>| {
            let mut record = current.ok_or_else(|| DomainError::not_found(ENTITY, id))?;
            record.toggle_like(user_id);
            Ok(record)
        })
        .await?;

        tracing::debug!(news_id = %id, likes = record.likes_count, "Like toggled");
        Ok(NewsPost::from_record(id, record))
    }

    /// Append a comment atomically.
    pub async fn add_comment(&self, id: &str, draft: CommentDraft) -> Result<NewsPost, DomainError> {
        draft.validate()?;
        let id = paths::check_key("id", id)?;
        let comment = draft.into_comment(Utc::now());

        let record = transact(self.store.as_ref(), &paths::news(id), |current: Option<NewsRecord>| {
            let mut record = current.ok_or_else(|| DomainError::not_found(ENTITY, id))?;
            record.comments.push(comment.clone());
            Ok(record)
        })
        .await?;

        tracing::info!(news_id = %id, comments = record.comments.len(), "Comment added");
        Ok(NewsPost::from_record(id, record))
    }
}

fn ensure_owner(record: &NewsRecord, actor: &Actor) -> Result<(), DomainError> {
    let owned = match record.author_id.as_deref() {
        Some(owner) => actor.can_act_for(owner),
        None => actor.is_admin,
    };
    if owned {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "only the author can change this post".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn service() -> (NewsService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (NewsService::new(store.clone()), store)
    }

    fn alice_post(title: &str) -> NewsDraft {
        NewsDraft::new(title, "Headline figure came in below consensus").with_author("Alice", "alice")
    }

    #[tokio::test]
    async fn test_create_then_get_by_id() {
        let (news, _) = service();
        let created = news.create_news(alice_post("CPI Release")).await.unwrap();

        let fetched = news.get_news_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.likes_count, 0);
        assert!(fetched.comments.is_empty());
        assert_eq!(fetched.created_at, fetched.updated_at);
        assert_eq!(fetched.author, "Alice");
        assert_eq!(fetched.category, "General");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (news, _) = service();
        assert!(news.get_news_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_feed() {
        let (news, _) = service();
        assert!(news.get_news().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_sorted_newest_first_and_skips_malformed() {
        let store = Arc::new(InMemoryStore::with_data(json!({
            "news": {
                "a": { "title": "old", "content": "c", "createdAt": "2024-01-01T00:00:00Z" },
                "b": { "title": "new", "content": "c", "createdAt": "2024-06-01T00:00:00Z" },
                "c": { "title": "mid", "content": "c", "createdAt": "2024-03-01T00:00:00Z",
                       "likedBy": { "u1": true, "u2": true } },
                "broken": { "content": 42 }
            }
        })));
        let news = NewsService::new(store);

        let posts = news.get_news().await.unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
        assert_eq!(posts[1].likes_count, 2);
        for pair in posts.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_like_scenario() {
        let (news, _) = service();
        let created = news.create_news(alice_post("CPI Release")).await.unwrap();

        let feed = news.get_news().await.unwrap();
        assert_eq!(feed[0].id, created.id);
        assert_eq!(feed[0].likes_count, 0);

        let liked = news.like_news(&created.id, "bob").await.unwrap();
        assert_eq!(liked.likes_count, 1);
        assert_eq!(liked.liked_by, BTreeMap::from([("bob".to_string(), true)]));

        let unliked = news.like_news(&created.id, "bob").await.unwrap();
        assert_eq!(unliked.likes_count, 0);
        assert!(unliked.liked_by.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_are_not_lost() {
        let (news, _) = service();
        let news = Arc::new(news);
        let post = news.create_news(alice_post("NFP")).await.unwrap();

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let news = news.clone();
                let id = post.id.clone();
                tokio::spawn(async move { news.like_news(&id, &format!("user{i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let post = news.get_news_by_id(&post.id).await.unwrap().unwrap();
        assert_eq!(post.likes_count, 40);
        assert_eq!(post.liked_by.len(), 40);
    }

    #[tokio::test]
    async fn test_update_missing_fails_without_write() {
        let (news, store) = service();
        let update = NewsUpdate {
            title: Some("x".into()),
            ..Default::default()
        };

        let err = news.update_news("ghost", update).await.unwrap_err();
        assert_eq!(err.to_string(), "News not found");
        assert_eq!(store.get("news/ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (news, _) = service();
        let created = news.create_news(alice_post("ECB")).await.unwrap();
        let update = NewsUpdate {
            title: Some("ECB cuts".into()),
            ..Default::default()
        };

        let updated = news.update_news(&created.id, update).await.unwrap();
        assert_eq!(updated.title, "ECB cuts");
        assert_eq!(updated.content, created.content);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let (news, _) = service();
        let err = news.delete_news("nonexistent-id").await.unwrap_err();
        assert_eq!(err.to_string(), "News not found");
    }

    #[tokio::test]
    async fn test_only_owner_may_delete() {
        let (news, _) = service();
        let created = news.create_news(alice_post("BoJ")).await.unwrap();

        let err = news
            .delete_news_as(&created.id, &Actor::user("mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        news.delete_news_as(&created.id, &Actor::user("alice")).await.unwrap();
        assert!(news.get_news_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_may_edit_any_post() {
        let (news, _) = service();
        let created = news.create_news(alice_post("RBA")).await.unwrap();
        let update = NewsUpdate {
            category: Some("Central Banks".into()),
            ..Default::default()
        };

        let updated = news
            .update_news_as(&created.id, update, &Actor::admin("ops"))
            .await
            .unwrap();
        assert_eq!(updated.category, "Central Banks");
    }

    #[tokio::test]
    async fn test_comments_append_in_order() {
        let (news, _) = service();
        let created = news.create_news(alice_post("GDP")).await.unwrap();

        for text in ["first", "second"] {
            let draft = CommentDraft {
                author: "Bob".into(),
                author_id: Some("bob".into()),
                text: text.into(),
            };
            news.add_comment(&created.id, draft).await.unwrap();
        }

        let post = news.get_news_by_id(&created.id).await.unwrap().unwrap();
        let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(post.comments_count, 2);
    }

    #[tokio::test]
    async fn test_my_posts_by_owner() {
        let (news, _) = service();
        news.create_news(alice_post("one")).await.unwrap();
        news.create_news(NewsDraft::new("two", "c").with_author("Alice", "other-alice"))
            .await
            .unwrap();

        let mine = news.get_news_by_owner("alice").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "one");
    }
}

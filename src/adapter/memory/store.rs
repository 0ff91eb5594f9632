//! In-process document store.
//!
//! Backs local runs and tests. Holds every collection behind one lock;
//! no await point is ever reached while the lock is held.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::{
    Article, ArticleQuery, Category, CommentRecord, LikeRecord, Poll, PollVoteRecord,
    ReadingHistoryEntry, RelevanceFeedback, User,
};
use crate::error::FeedError;
use crate::port::{ArticleCounter, DocumentStore};

#[derive(Default)]
struct Collections {
    users: FxHashMap<String, User>,
    articles: FxHashMap<String, Article>,
    reading_history: Vec<ReadingHistoryEntry>,
    comments: Vec<CommentRecord>,
    polls: FxHashMap<String, Poll>,
    poll_votes: FxHashSet<PollVoteRecord>,
    likes: FxHashSet<LikeRecord>,
    relevance_feedback: Vec<RelevanceFeedback>,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_user(&self, user: User) {
        self.write().users.insert(user.user_id.clone(), user);
    }

    pub fn insert_article(&self, article: Article) {
        self.write()
            .articles
            .insert(article.article_id.clone(), article);
    }

    /// Re-categorizes an article, as the background enrichment job does.
    pub fn set_article_category(&self, article_id: &str, category: Option<Category>) {
        if let Some(article) = self.write().articles.get_mut(article_id) {
            article.category = category;
        }
    }

    /// Inserts or replaces the entry for the (user, article) pair.
    pub fn insert_reading_history(&self, entry: ReadingHistoryEntry) {
        let mut guard = self.write();
        guard
            .reading_history
            .retain(|e| !(e.user_id == entry.user_id && e.article_id == entry.article_id));
        guard.reading_history.push(entry);
    }

    pub fn insert_comment(
        &self,
        user_id: impl Into<String>,
        article_id: impl Into<String>,
    ) -> CommentRecord {
        let record = CommentRecord {
            comment_id: format!("comment_{}", uuid::Uuid::new_v4().simple()),
            user_id: user_id.into(),
            article_id: article_id.into(),
        };
        self.write().comments.push(record.clone());
        record
    }

    pub fn insert_poll(&self, poll: Poll) {
        self.write().polls.insert(poll.poll_id.clone(), poll);
    }

    /// Returns `false` when the user already voted on the poll.
    pub fn insert_poll_vote(&self, user_id: impl Into<String>, poll_id: impl Into<String>) -> bool {
        self.write().poll_votes.insert(PollVoteRecord {
            user_id: user_id.into(),
            poll_id: poll_id.into(),
        })
    }

    #[must_use]
    pub fn relevance_feedback_count(&self) -> usize {
        self.read().relevance_feedback.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, FeedError> {
        Ok(self.read().users.get(user_id).cloned())
    }

    async fn get_article(&self, article_id: &str) -> Result<Option<Article>, FeedError> {
        Ok(self.read().articles.get(article_id).cloned())
    }

    async fn find_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, FeedError> {
        let guard = self.read();
        let mut matching: Vec<&Article> = guard
            .articles
            .values()
            .filter(|article| query.matches(article))
            .collect();
        // Id as secondary key keeps equal timestamps in a stable order.
        matching.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.article_id.cmp(&b.article_id))
        });
        Ok(matching
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn get_articles_by_ids(
        &self,
        article_ids: &[String],
    ) -> Result<Vec<Article>, FeedError> {
        let guard = self.read();
        let mut seen = FxHashSet::default();
        Ok(article_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| guard.articles.get(id).cloned())
            .collect())
    }

    async fn reading_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<ReadingHistoryEntry>, FeedError> {
        Ok(self
            .read()
            .reading_history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn comments_by_user(&self, user_id: &str) -> Result<Vec<CommentRecord>, FeedError> {
        Ok(self
            .read()
            .comments
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn poll_votes_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PollVoteRecord>, FeedError> {
        Ok(self
            .read()
            .poll_votes
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_polls_by_ids(&self, poll_ids: &[String]) -> Result<Vec<Poll>, FeedError> {
        let guard = self.read();
        Ok(poll_ids
            .iter()
            .filter_map(|id| guard.polls.get(id).cloned())
            .collect())
    }

    async fn likes_by_user(&self, user_id: &str) -> Result<Vec<LikeRecord>, FeedError> {
        Ok(self
            .read()
            .likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn relevance_feedback_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RelevanceFeedback>, FeedError> {
        Ok(self
            .read()
            .relevance_feedback
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_interests(
        &self,
        user_id: &str,
        interests: &[Category],
    ) -> Result<Option<User>, FeedError> {
        let mut guard = self.write();
        Ok(guard.users.get_mut(user_id).map(|user| {
            user.declared_interests = interests.iter().cloned().collect();
            user.clone()
        }))
    }

    async fn increment_article_counter(
        &self,
        article_id: &str,
        counter: ArticleCounter,
    ) -> Result<(), FeedError> {
        if let Some(article) = self.write().articles.get_mut(article_id) {
            match counter {
                ArticleCounter::Likes => article.likes += 1,
                ArticleCounter::Dislikes => article.dislikes += 1,
                ArticleCounter::Views => article.view_count += 1,
            }
        }
        Ok(())
    }

    async fn ensure_reading_history(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<(), FeedError> {
        let mut guard = self.write();
        let exists = guard
            .reading_history
            .iter()
            .any(|e| e.user_id == user_id && e.article_id == article_id);
        if !exists {
            guard
                .reading_history
                .push(ReadingHistoryEntry::new(user_id, article_id));
        }
        Ok(())
    }

    async fn record_reading_time(
        &self,
        user_id: &str,
        article_id: &str,
        time_delta: u64,
        completed: bool,
    ) -> Result<(), FeedError> {
        let mut guard = self.write();
        if let Some(entry) = guard
            .reading_history
            .iter_mut()
            .find(|e| e.user_id == user_id && e.article_id == article_id)
        {
            entry.time_spent = entry.time_spent.saturating_add(time_delta);
            entry.completed = completed;
        } else {
            guard.reading_history.push(
                ReadingHistoryEntry::new(user_id, article_id)
                    .with_time_spent(time_delta)
                    .completed(completed),
            );
        }
        Ok(())
    }

    async fn upsert_like(&self, user_id: &str, article_id: &str) -> Result<bool, FeedError> {
        Ok(self.write().likes.insert(LikeRecord {
            user_id: user_id.to_string(),
            article_id: article_id.to_string(),
        }))
    }

    async fn append_relevance_feedback(
        &self,
        feedback: &RelevanceFeedback,
    ) -> Result<(), FeedError> {
        self.write().relevance_feedback.push(feedback.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn store_with_articles() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        let now = Utc::now();
        for (id, hours, category) in [("a1", 3, "Sports"), ("a2", 1, "Sports"), ("a3", 2, "Politics")]
        {
            store.insert_article(
                Article::new(id, now - Duration::hours(hours)).with_category(category),
            );
        }
        store
    }

    #[tokio::test]
    async fn find_articles_filters_sorts_and_paginates() {
        let store = store_with_articles();
        let query = ArticleQuery::new(10).with_category(Some("Sports".into()));
        let ids: Vec<String> = store
            .find_articles(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.article_id)
            .collect();
        assert_eq!(ids, vec!["a2", "a1"]);

        let page = store
            .find_articles(&ArticleQuery::new(1).with_skip(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].article_id, "a3");
    }

    #[tokio::test]
    async fn reading_time_is_additive_and_completion_overwrites() {
        let store = InMemoryDocumentStore::new();
        store.ensure_reading_history("u", "a").await.unwrap();
        store.ensure_reading_history("u", "a").await.unwrap();
        store.record_reading_time("u", "a", 30, true).await.unwrap();
        store.record_reading_time("u", "a", 15, false).await.unwrap();

        let history = store.reading_history("u").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].time_spent, 45);
        assert!(!history[0].completed);
    }

    #[tokio::test]
    async fn likes_and_votes_are_unique_memberships() {
        let store = InMemoryDocumentStore::new();
        assert!(store.upsert_like("u", "a").await.unwrap());
        assert!(!store.upsert_like("u", "a").await.unwrap());
        assert_eq!(store.likes_by_user("u").await.unwrap().len(), 1);

        assert!(store.insert_poll_vote("u", "p"));
        assert!(!store.insert_poll_vote("u", "p"));
        assert_eq!(store.poll_votes_by_user("u").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn articles_by_ids_skips_unknown_and_duplicates() {
        let store = store_with_articles();
        let ids = vec!["a1".to_string(), "missing".to_string(), "a1".to_string()];
        let found = store.get_articles_by_ids(&ids).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}

//! Reduces a user's behavioral history into an [`AffinityProfile`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::domain::affinity::COMMENTS_MAX;
use crate::domain::{
    AffinityProfile, Article, Category, CommentRecord, LikeRecord, Poll, ReadingHistoryEntry,
};
use crate::error::FeedError;
use crate::observability::metrics::FeedMetrics;
use crate::port::DocumentStore;

const COMPLETION_WEIGHT: f64 = 20.0;
const ENGAGEMENT_WEIGHT: f64 = 20.0;
const POINTS_PER_COMMENT: f64 = 3.0;
const COMMENTS_FOR_MAX: usize = 3;

/// Anything that can produce a fresh profile for a user. The cache reads
/// through this on a miss.
#[async_trait]
pub trait AffinitySource: Send + Sync {
    async fn compute(&self, user_id: &str) -> Result<AffinityProfile, FeedError>;
}

pub struct AffinityAggregator {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<FeedMetrics>,
}

impl AffinityAggregator {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Arc<FeedMetrics>) -> Self {
        Self { store, metrics }
    }
}

#[async_trait]
impl AffinitySource for AffinityAggregator {
    /// Store failures propagate; no partial profile is ever returned.
    #[instrument(skip(self))]
    async fn compute(&self, user_id: &str) -> Result<AffinityProfile, FeedError> {
        let timer = self.metrics.affinity_compute_duration.start_timer();

        let (history, comments, votes, likes) = futures::try_join!(
            self.store.reading_history(user_id),
            self.store.comments_by_user(user_id),
            self.store.poll_votes_by_user(user_id),
            self.store.likes_by_user(user_id),
        )?;

        let poll_ids: Vec<String> = votes.into_iter().map(|vote| vote.poll_id).collect();
        let polls = if poll_ids.is_empty() {
            Vec::new()
        } else {
            self.store.get_polls_by_ids(&poll_ids).await?
        };

        let referenced = referenced_article_ids(&history, &comments, &polls, &likes);
        let articles = if referenced.is_empty() {
            Vec::new()
        } else {
            self.store.get_articles_by_ids(&referenced).await?
        };

        let profile = build_profile(&history, &comments, &polls, &likes, &articles);

        timer.observe_duration();
        self.metrics.affinity_computations.inc();
        debug!(
            user_id,
            history = history.len(),
            comments = comments.len(),
            polls = polls.len(),
            likes = likes.len(),
            "affinity profile computed"
        );
        Ok(profile)
    }
}

fn referenced_article_ids(
    history: &[ReadingHistoryEntry],
    comments: &[CommentRecord],
    polls: &[Poll],
    likes: &[LikeRecord],
) -> Vec<String> {
    let mut seen = FxHashSet::default();
    history
        .iter()
        .map(|entry| entry.article_id.as_str())
        .chain(comments.iter().map(|comment| comment.article_id.as_str()))
        .chain(polls.iter().map(|poll| poll.article_id.as_str()))
        .chain(likes.iter().map(|like| like.article_id.as_str()))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Pure reduction over already-fetched records. Records whose article is
/// unknown or uncategorized contribute nothing.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn build_profile(
    history: &[ReadingHistoryEntry],
    comments: &[CommentRecord],
    polls: &[Poll],
    likes: &[LikeRecord],
    articles: &[Article],
) -> AffinityProfile {
    let by_id: FxHashMap<&str, &Article> = articles
        .iter()
        .map(|article| (article.article_id.as_str(), article))
        .collect();
    let category_of = |article_id: &str| {
        by_id
            .get(article_id)
            .copied()
            .and_then(|article| article.category.as_ref().map(|category| (article, category)))
    };

    let mut profile = AffinityProfile::empty();

    // (completed, total) and (ratio sum, baseline count) per category
    let mut completion: BTreeMap<&Category, (usize, usize)> = BTreeMap::new();
    let mut engagement: BTreeMap<&Category, (f64, usize)> = BTreeMap::new();
    for entry in history {
        let Some((article, category)) = category_of(entry.article_id.as_str()) else {
            continue;
        };
        let tally = completion.entry(category).or_default();
        tally.1 += 1;
        if entry.completed {
            tally.0 += 1;
        }
        if let Some(baseline) = article.engagement_baseline() {
            let ratio = (entry.time_spent as f64 / baseline).min(1.0);
            let sum = engagement.entry(category).or_default();
            sum.0 += ratio;
            sum.1 += 1;
        }
    }
    for (category, (completed, total)) in completion {
        profile.set_completion(
            category.clone(),
            completed as f64 / total as f64 * COMPLETION_WEIGHT,
        );
    }
    for (category, (ratio_sum, count)) in engagement {
        profile.set_engagement(category.clone(), ratio_sum / count as f64 * ENGAGEMENT_WEIGHT);
    }

    let mut comment_counts: BTreeMap<&Category, usize> = BTreeMap::new();
    for comment in comments {
        if let Some((_, category)) = category_of(comment.article_id.as_str()) {
            *comment_counts.entry(category).or_default() += 1;
        }
    }
    for (category, count) in comment_counts {
        profile.set_comments(category.clone(), comment_score(count));
    }

    for poll in polls {
        if let Some((_, category)) = category_of(poll.article_id.as_str()) {
            profile.mark_poll_vote(category.clone());
        }
    }
    for like in likes {
        if let Some((_, category)) = category_of(like.article_id.as_str()) {
            profile.mark_like(category.clone());
        }
    }

    profile
}

/// 1 → 3, 2 → 6, 3 or more → 10.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn comment_score(count: usize) -> f64 {
    if count >= COMMENTS_FOR_MAX {
        COMMENTS_MAX
    } else {
        count as f64 * POINTS_PER_COMMENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::adapter::memory::InMemoryDocumentStore;
    use crate::test_support::FailingDocumentStore;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn article(id: &str, category: &str) -> Article {
        Article::new(id, Utc::now()).with_category(category)
    }

    #[test]
    fn comment_score_is_flat_beyond_three() {
        assert!(approx(comment_score(0), 0.0));
        assert!(approx(comment_score(1), 3.0));
        assert!(approx(comment_score(2), 6.0));
        assert!(approx(comment_score(3), 10.0));
        assert!(approx(comment_score(12), 10.0));
    }

    #[test]
    fn completion_and_engagement_per_category() {
        let articles = vec![
            article("t1", "Technology").with_reading_time(100),
            article("t2", "Technology"),
            article("s1", "Sports").with_reading_time(60),
        ];
        let history = vec![
            ReadingHistoryEntry::new("u", "t1")
                .with_time_spent(50)
                .completed(true),
            ReadingHistoryEntry::new("u", "t2").with_time_spent(500),
            ReadingHistoryEntry::new("u", "s1").with_time_spent(600),
        ];

        let profile = build_profile(&history, &[], &[], &[], &articles);
        let tech = Category::from("Technology");
        let sports = Category::from("Sports");

        assert!(approx(profile.completion(Some(&tech)), 10.0));
        assert!(approx(profile.completion(Some(&sports)), 0.0));
        // t2 has no baseline and is excluded from engagement only
        assert!(approx(profile.engagement(Some(&tech)), 10.0));
        assert!(approx(profile.engagement(Some(&sports)), 20.0));
    }

    #[test]
    fn uncategorized_and_unknown_articles_are_skipped() {
        let mut loose = article("x", "Tmp");
        loose.category = None;
        let history = vec![
            ReadingHistoryEntry::new("u", "x").completed(true),
            ReadingHistoryEntry::new("u", "missing").completed(true),
        ];
        let profile = build_profile(&history, &[], &[], &[], &[loose]);
        assert!(profile.is_empty());
    }

    #[test]
    fn votes_and_likes_are_flat_markers() {
        let articles = vec![article("p1", "Politics"), article("p2", "Politics")];
        let polls = vec![
            Poll {
                poll_id: "poll1".into(),
                article_id: "p1".into(),
            },
            Poll {
                poll_id: "poll2".into(),
                article_id: "p2".into(),
            },
        ];
        let likes = vec![LikeRecord {
            user_id: "u".into(),
            article_id: "p2".into(),
        }];
        let profile = build_profile(&[], &[], &polls, &likes, &articles);
        let politics = Category::from("Politics");
        assert!(approx(profile.poll_votes(Some(&politics)), 5.0));
        assert!(approx(profile.likes(Some(&politics)), 5.0));
        assert!(profile.completion_map().is_empty());
    }

    #[tokio::test]
    async fn compute_reads_every_signal_from_store() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.insert_article(article("p1", "Politics"));
        store.insert_article(article("p2", "Politics"));
        store.insert_comment("u", "p1");
        store.insert_comment("u", "p1");
        store.insert_comment("u", "p2");
        store.insert_poll(Poll {
            poll_id: "poll1".into(),
            article_id: "p2".into(),
        });
        store.insert_poll_vote("u", "poll1");

        let aggregator = AffinityAggregator::new(store, Arc::new(FeedMetrics::detached()));
        let profile = aggregator.compute("u").await.expect("profile");
        let politics = Category::from("Politics");
        assert!(approx(profile.comments(Some(&politics)), 10.0));
        assert!(approx(profile.poll_votes(Some(&politics)), 5.0));
        assert!(profile.completion_map().is_empty());

        let again = aggregator.compute("u").await.expect("profile");
        assert_eq!(profile, again);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let aggregator = AffinityAggregator::new(
            Arc::new(FailingDocumentStore),
            Arc::new(FeedMetrics::detached()),
        );
        let err = aggregator.compute("u").await.unwrap_err();
        assert!(matches!(err, FeedError::Store { .. }));
    }
}

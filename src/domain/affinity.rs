//! Per-category behavioral affinity, the cached output of the aggregator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::user::Category;

pub const COMPLETION_MAX: f64 = 20.0;
pub const ENGAGEMENT_MAX: f64 = 20.0;
pub const COMMENTS_MAX: f64 = 10.0;
pub const POLL_VOTE_SCORE: f64 = 5.0;
pub const LIKE_SCORE: f64 = 5.0;

/// Five signal families keyed by category. A missing key is a zero
/// contribution; every stored value is clamped to its family bound.
///
/// `BTreeMap` keeps the serialized form stable, so a cached profile
/// round-trips byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityProfile {
    #[serde(default)]
    completion: BTreeMap<Category, f64>,
    #[serde(default)]
    engagement: BTreeMap<Category, f64>,
    #[serde(default)]
    comments: BTreeMap<Category, f64>,
    #[serde(default)]
    poll_votes: BTreeMap<Category, f64>,
    #[serde(default)]
    likes: BTreeMap<Category, f64>,
}

fn bounded(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

fn lookup(map: &BTreeMap<Category, f64>, category: Option<&Category>) -> f64 {
    category
        .and_then(|c| map.get(c))
        .copied()
        .unwrap_or(0.0)
}

impl AffinityProfile {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completion.is_empty()
            && self.engagement.is_empty()
            && self.comments.is_empty()
            && self.poll_votes.is_empty()
            && self.likes.is_empty()
    }

    pub fn set_completion(&mut self, category: Category, score: f64) {
        self.completion
            .insert(category, bounded(score, COMPLETION_MAX));
    }

    pub fn set_engagement(&mut self, category: Category, score: f64) {
        self.engagement
            .insert(category, bounded(score, ENGAGEMENT_MAX));
    }

    pub fn set_comments(&mut self, category: Category, score: f64) {
        self.comments.insert(category, bounded(score, COMMENTS_MAX));
    }

    pub fn mark_poll_vote(&mut self, category: Category) {
        self.poll_votes.insert(category, POLL_VOTE_SCORE);
    }

    pub fn mark_like(&mut self, category: Category) {
        self.likes.insert(category, LIKE_SCORE);
    }

    #[must_use]
    pub fn completion(&self, category: Option<&Category>) -> f64 {
        lookup(&self.completion, category)
    }

    #[must_use]
    pub fn engagement(&self, category: Option<&Category>) -> f64 {
        lookup(&self.engagement, category)
    }

    #[must_use]
    pub fn comments(&self, category: Option<&Category>) -> f64 {
        lookup(&self.comments, category)
    }

    #[must_use]
    pub fn poll_votes(&self, category: Option<&Category>) -> f64 {
        lookup(&self.poll_votes, category)
    }

    #[must_use]
    pub fn likes(&self, category: Option<&Category>) -> f64 {
        lookup(&self.likes, category)
    }

    #[must_use]
    pub fn completion_map(&self) -> &BTreeMap<Category, f64> {
        &self.completion
    }

    #[must_use]
    pub fn engagement_map(&self) -> &BTreeMap<Category, f64> {
        &self.engagement
    }

    #[must_use]
    pub fn comments_map(&self) -> &BTreeMap<Category, f64> {
        &self.comments
    }

    #[must_use]
    pub fn poll_votes_map(&self) -> &BTreeMap<Category, f64> {
        &self.poll_votes
    }

    #[must_use]
    pub fn likes_map(&self) -> &BTreeMap<Category, f64> {
        &self.likes
    }

    /// True when every stored value sits inside its family bound.
    #[must_use]
    pub fn within_bounds(&self) -> bool {
        let within = |map: &BTreeMap<Category, f64>, max: f64| {
            map.values().all(|v| (0.0..=max).contains(v))
        };
        within(&self.completion, COMPLETION_MAX)
            && within(&self.engagement, ENGAGEMENT_MAX)
            && within(&self.comments, COMMENTS_MAX)
            && within(&self.poll_votes, POLL_VOTE_SCORE)
            && within(&self.likes, LIKE_SCORE)
    }
}

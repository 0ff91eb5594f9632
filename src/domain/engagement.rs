//! Behavioral records read by the affinity aggregator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// One entry per (user, article); upserted, never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingHistoryEntry {
    pub user_id: String,
    pub article_id: String,
    /// Seconds, additive across reports.
    pub time_spent: u64,
    pub completed: bool,
}

impl ReadingHistoryEntry {
    #[must_use]
    pub fn new(user_id: impl Into<String>, article_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            article_id: article_id.into(),
            time_spent: 0,
            completed: false,
        }
    }

    #[must_use]
    pub fn with_time_spent(mut self, seconds: u64) -> Self {
        self.time_spent = seconds;
        self
    }

    #[must_use]
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub user_id: String,
    pub article_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub poll_id: String,
    pub article_id: String,
}

/// At most one per (user, poll).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollVoteRecord {
    pub user_id: String,
    pub poll_id: String,
}

/// Idempotent membership per (user, article).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeRecord {
    pub user_id: String,
    pub article_id: String,
}

/// Append-only; repeated feedback for the same article is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceFeedback {
    pub feedback_id: String,
    pub user_id: String,
    pub article_id: String,
    pub is_relevant: bool,
    pub created_at: DateTime<Utc>,
}

impl RelevanceFeedback {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        article_id: impl Into<String>,
        is_relevant: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feedback_id: format!("feedback_{}", uuid::Uuid::new_v4().simple()),
            user_id: user_id.into(),
            article_id: article_id.into(),
            is_relevant,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    View,
    Like,
    Dislike,
}

impl InteractionAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionAction::View => "view",
            InteractionAction::Like => "like",
            InteractionAction::Dislike => "dislike",
        }
    }
}

impl fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionAction {
    type Err = FeedError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "view" => Ok(InteractionAction::View),
            "like" => Ok(InteractionAction::Like),
            "dislike" => Ok(InteractionAction::Dislike),
            other => Err(FeedError::InvalidInput(format!(
                "unknown interaction action: {other}"
            ))),
        }
    }
}

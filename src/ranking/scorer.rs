//! Additive article scoring.
//!
//! The score is a raw sum of category-keyed signals, a freshness bonus and
//! a randomized discovery wildcard. Time and randomness are both supplied
//! by the caller, so with the wildcard disabled the function is pure.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::{AffinityProfile, Article, Category};

pub const INTEREST_BONUS: f64 = 20.0;
pub const RELEVANCE_ADJUSTMENT: f64 = 10.0;
pub const RELEVANT_ABOVE: f64 = 0.5;
pub const IRRELEVANT_BELOW: f64 = 0.3;
pub const FRESH_BONUS: f64 = 10.0;
pub const RECENT_BONUS: f64 = 5.0;
pub const WILDCARD_BONUS: f64 = 10.0;
pub const DEFAULT_WILDCARD_PROBABILITY: f64 = 0.20;

const FRESH_HOURS: i64 = 6;
const RECENT_HOURS: i64 = 24;

/// Per-signal contributions for one article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub interest: f64,
    pub completion: f64,
    pub engagement: f64,
    pub comments: f64,
    pub poll_votes: f64,
    pub likes: f64,
    pub relevance: f64,
    pub freshness: f64,
    pub wildcard: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.interest
            + self.completion
            + self.engagement
            + self.comments
            + self.poll_votes
            + self.likes
            + self.relevance
            + self.freshness
            + self.wildcard
    }

    #[must_use]
    pub fn wildcard_applied(&self) -> bool {
        self.wildcard > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArticleScorer {
    wildcard_probability: f64,
}

impl Default for ArticleScorer {
    fn default() -> Self {
        Self::new(DEFAULT_WILDCARD_PROBABILITY)
    }
}

impl ArticleScorer {
    /// Probability is clamped into `[0, 1]`; NaN disables the wildcard.
    #[must_use]
    pub fn new(wildcard_probability: f64) -> Self {
        let wildcard_probability = if wildcard_probability.is_nan() {
            0.0
        } else {
            wildcard_probability.clamp(0.0, 1.0)
        };
        Self {
            wildcard_probability,
        }
    }

    #[must_use]
    pub fn without_wildcard() -> Self {
        Self::new(0.0)
    }

    #[must_use]
    pub fn wildcard_probability(&self) -> f64 {
        self.wildcard_probability
    }

    pub fn score<R: Rng + ?Sized>(
        &self,
        article: &Article,
        declared_interests: &BTreeSet<Category>,
        affinity: &AffinityProfile,
        relevance_by_category: &BTreeMap<Category, f64>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> f64 {
        self.breakdown(
            article,
            declared_interests,
            affinity,
            relevance_by_category,
            now,
            rng,
        )
        .total()
    }

    pub fn breakdown<R: Rng + ?Sized>(
        &self,
        article: &Article,
        declared_interests: &BTreeSet<Category>,
        affinity: &AffinityProfile,
        relevance_by_category: &BTreeMap<Category, f64>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ScoreBreakdown {
        let category = article.category.as_ref();

        let interest = match category {
            Some(c) if declared_interests.contains(c) => INTEREST_BONUS,
            _ => 0.0,
        };
        let relevance = category
            .and_then(|c| relevance_by_category.get(c))
            .map_or(0.0, |average| relevance_adjustment(*average));

        ScoreBreakdown {
            interest,
            completion: affinity.completion(category),
            engagement: affinity.engagement(category),
            comments: affinity.comments(category),
            poll_votes: affinity.poll_votes(category),
            likes: affinity.likes(category),
            relevance,
            freshness: freshness_bonus(article.published_at, now),
            wildcard: self.wildcard(rng),
        }
    }

    fn wildcard<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.wildcard_probability > 0.0 && rng.random_bool(self.wildcard_probability) {
            WILDCARD_BONUS
        } else {
            0.0
        }
    }
}

/// `+10` above 0.5, `-10` below 0.3, nothing in between.
#[must_use]
pub fn relevance_adjustment(average: f64) -> f64 {
    if average > RELEVANT_ABOVE {
        RELEVANCE_ADJUSTMENT
    } else if average < IRRELEVANT_BELOW {
        -RELEVANCE_ADJUSTMENT
    } else {
        0.0
    }
}

/// Both bounds are inclusive. A publish time ahead of `now` counts as fresh.
#[must_use]
pub fn freshness_bonus(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = now - published_at;
    if age <= Duration::hours(FRESH_HOURS) {
        FRESH_BONUS
    } else if age <= Duration::hours(RECENT_HOURS) {
        RECENT_BONUS
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn relevance_dead_zone_is_inclusive() {
        assert!((relevance_adjustment(0.51) - 10.0).abs() < f64::EPSILON);
        assert!(relevance_adjustment(0.5).abs() < f64::EPSILON);
        assert!(relevance_adjustment(0.3).abs() < f64::EPSILON);
        assert!((relevance_adjustment(0.29) + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn future_articles_count_as_fresh() {
        let published = now() + Duration::minutes(5);
        assert!((freshness_bonus(published, now()) - FRESH_BONUS).abs() < f64::EPSILON);
    }

    #[test]
    fn uncategorized_article_gets_only_time_terms() {
        let mut affinity = AffinityProfile::empty();
        affinity.set_completion("Technology".into(), 20.0);
        let interests: BTreeSet<Category> = [Category::from("Technology")].into();
        let article = Article::new("a", now() - Duration::hours(2));

        let breakdown = ArticleScorer::new(1.0).breakdown(
            &article,
            &interests,
            &affinity,
            &BTreeMap::new(),
            now(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!((breakdown.total() - 20.0).abs() < f64::EPSILON);
        assert!(breakdown.wildcard_applied());
    }

    #[test]
    fn negative_feedback_subtracts() {
        let article = Article::new("a", now() - Duration::days(3)).with_category("Sports");
        let relevance = BTreeMap::from([(Category::from("Sports"), 0.0)]);
        let score = ArticleScorer::without_wildcard().score(
            &article,
            &BTreeSet::new(),
            &AffinityProfile::empty(),
            &relevance,
            now(),
            &mut StdRng::seed_from_u64(7),
        );
        assert!((score + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn probability_is_clamped() {
        assert!((ArticleScorer::new(3.0).wildcard_probability() - 1.0).abs() < f64::EPSILON);
        assert!(ArticleScorer::new(-1.0).wildcard_probability().abs() < f64::EPSILON);
        assert!(ArticleScorer::new(f64::NAN).wildcard_probability().abs() < f64::EPSILON);
    }
}

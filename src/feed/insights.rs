//! Reading statistics and the weekly summary built from reading history.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::instrument;

use crate::domain::{ReadingStats, WeeklyReport};
use crate::error::FeedError;
use crate::port::DocumentStore;

const UNCATEGORIZED: &str = "Other";
const EMPTY_SUMMARY: &str = "Start reading articles to generate your personalized weekly insights.";

pub struct ReadingInsights {
    store: Arc<dyn DocumentStore>,
}

impl ReadingInsights {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub async fn reading_stats(&self, user_id: &str) -> Result<ReadingStats, FeedError> {
        let history = self.store.reading_history(user_id).await?;
        let article_ids: Vec<String> = history.iter().map(|h| h.article_id.clone()).collect();
        let articles = if article_ids.is_empty() {
            Vec::new()
        } else {
            self.store.get_articles_by_ids(&article_ids).await?
        };
        let categories: BTreeMap<&str, &str> = articles
            .iter()
            .map(|article| {
                let category = article
                    .category
                    .as_ref()
                    .map_or(UNCATEGORIZED, |c| c.as_str());
                (article.article_id.as_str(), category)
            })
            .collect();

        // history entries whose article is gone are counted as read but
        // left out of the breakdown
        let mut category_breakdown = BTreeMap::new();
        for entry in &history {
            if let Some(category) = categories.get(entry.article_id.as_str()) {
                *category_breakdown.entry((*category).to_string()).or_insert(0) += 1;
            }
        }

        Ok(ReadingStats {
            total_reading_time: history
                .iter()
                .fold(0u64, |total, h| total.saturating_add(h.time_spent)),
            articles_read: history.len(),
            articles_completed: history.iter().filter(|h| h.completed).count(),
            category_breakdown,
        })
    }

    /// # Errors
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub async fn weekly_report(&self, user_id: &str) -> Result<WeeklyReport, FeedError> {
        let stats = self.reading_stats(user_id).await?;
        Ok(build_weekly_report(&stats))
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn build_weekly_report(stats: &ReadingStats) -> WeeklyReport {
    let minutes_spent = stats.total_reading_time / 60;
    let completion_rate = if stats.articles_read > 0 {
        (stats.articles_completed as f64 / stats.articles_read as f64 * 100.0).round() as u32
    } else {
        0
    };
    // highest count wins; BTreeMap order makes ties go to the smallest name
    let top_category = stats
        .category_breakdown
        .iter()
        .fold(None::<(&String, usize)>, |best, (name, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((name, *count)),
        })
        .map(|(name, _)| name.clone());

    let mut insights = Vec::new();
    if stats.articles_read > 0 {
        insights.push(format!(
            "You've engaged with {} articles this week, showing a healthy appetite for staying informed.",
            stats.articles_read
        ));
    }
    if minutes_spent > 30 {
        insights.push(format!(
            "With {minutes_spent} minutes of reading, you're investing quality time in understanding the world around you."
        ));
    } else if minutes_spent > 0 {
        insights.push(format!(
            "You've spent {minutes_spent} minutes reading. Consider setting aside a few more minutes each day for deeper engagement."
        ));
    }
    if let Some(category) = &top_category {
        insights.push(format!(
            "{category} has captured most of your attention. This focus helps you build expertise in areas that matter to you."
        ));
    }
    if completion_rate > 70 {
        insights.push(format!(
            "With a {completion_rate}% completion rate, you're reading articles thoroughly rather than just skimming headlines."
        ));
    } else if stats.articles_read > 0 {
        insights.push(format!(
            "Your {completion_rate}% completion rate suggests room for deeper engagement. Try the collapsible sections for better understanding."
        ));
    }

    let summary = if insights.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        insights.join("\n\n")
    };

    WeeklyReport {
        summary,
        articles_read: stats.articles_read,
        minutes_spent,
        top_category,
        completion_rate,
    }
}

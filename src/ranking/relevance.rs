//! Per-category average of explicit relevance feedback.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::{Article, Category, RelevanceFeedback};
use crate::error::FeedError;
use crate::port::DocumentStore;

/// Resolves every article the user gave feedback on, including ones far
/// outside the current candidate window, and averages per category
/// (`relevant = 1`, `not relevant = 0`). All feedback weighs the same
/// regardless of age.
pub async fn category_relevance(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<BTreeMap<Category, f64>, FeedError> {
    let feedback = store.relevance_feedback_by_user(user_id).await?;
    if feedback.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut seen = FxHashSet::default();
    let article_ids: Vec<String> = feedback
        .iter()
        .filter(|record| seen.insert(record.article_id.as_str()))
        .map(|record| record.article_id.clone())
        .collect();
    let articles = store.get_articles_by_ids(&article_ids).await?;

    Ok(average_by_category(&feedback, &articles))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn average_by_category(
    feedback: &[RelevanceFeedback],
    articles: &[Article],
) -> BTreeMap<Category, f64> {
    let categories: FxHashMap<&str, &Category> = articles
        .iter()
        .filter_map(|article| {
            article
                .category
                .as_ref()
                .map(|category| (article.article_id.as_str(), category))
        })
        .collect();

    let mut tallies: BTreeMap<&Category, (usize, usize)> = BTreeMap::new();
    for record in feedback {
        let Some(category) = categories.get(record.article_id.as_str()) else {
            continue;
        };
        let tally = tallies.entry(category).or_default();
        tally.1 += 1;
        if record.is_relevant {
            tally.0 += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(category, (relevant, total))| (category.clone(), relevant as f64 / total as f64))
        .collect()
}

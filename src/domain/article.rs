use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub article_id: String,
    pub title: String,
    /// Re-categorizable; `None` contributes no category signal.
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Nominal reading time used as the engagement baseline.
    pub reading_time_sec: Option<u32>,
    #[serde(default)]
    pub is_developing: bool,
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub dislikes: i64,
    #[serde(default)]
    pub view_count: i64,
}

impl Article {
    #[must_use]
    pub fn new(article_id: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            article_id: article_id.into(),
            title: String::new(),
            category: None,
            subcategory: None,
            source: String::new(),
            published_at,
            reading_time_sec: None,
            is_developing: false,
            is_breaking: false,
            likes: 0,
            dislikes: 0,
            view_count: 0,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    #[must_use]
    pub fn with_reading_time(mut self, seconds: u32) -> Self {
        self.reading_time_sec = Some(seconds);
        self
    }

    #[must_use]
    pub fn developing(mut self, is_developing: bool) -> Self {
        self.is_developing = is_developing;
        self
    }

    #[must_use]
    pub fn breaking(mut self, is_breaking: bool) -> Self {
        self.is_breaking = is_breaking;
        self
    }

    /// Baseline in seconds when it can be used for the engagement ratio.
    #[must_use]
    pub fn engagement_baseline(&self) -> Option<f64> {
        self.reading_time_sec
            .filter(|secs| *secs > 0)
            .map(f64::from)
    }
}

/// Filtered, newest-first range query over `articles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub developing: Option<bool>,
    /// Matches articles that are developing or breaking.
    pub highlighted_only: bool,
    pub skip: usize,
    pub limit: usize,
}

impl ArticleQuery {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: Option<String>) -> Self {
        self.subcategory = subcategory;
        self
    }

    #[must_use]
    pub fn with_developing(mut self, developing: Option<bool>) -> Self {
        self.developing = developing;
        self
    }

    #[must_use]
    pub fn highlighted(mut self) -> Self {
        self.highlighted_only = true;
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(category) = &self.category {
            if article.category.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(subcategory) = &self.subcategory {
            if article.subcategory.as_deref() != Some(subcategory.as_str()) {
                return false;
            }
        }
        if let Some(developing) = self.developing {
            if article.is_developing != developing {
                return false;
            }
        }
        !self.highlighted_only || article.is_developing || article.is_breaking
    }
}

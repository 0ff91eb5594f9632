use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic tag on an article; the unit of personalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub declared_interests: BTreeSet<Category>,
}

impl User {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            declared_interests: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_interests<I, C>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        self.declared_interests = interests.into_iter().map(Into::into).collect();
        self
    }

    /// Users without declared interests get the chronological feed.
    #[must_use]
    pub fn has_interests(&self) -> bool {
        !self.declared_interests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_interests_deduplicates() {
        let user = User::new("u1").with_interests(["Sports", "Sports", "Politics"]);
        assert_eq!(user.declared_interests.len(), 2);
        assert!(user.declared_interests.contains("Sports"));
        assert!(user.has_interests());
    }

    #[test]
    fn category_serializes_as_plain_string() {
        let json = serde_json::to_string(&Category::from("Technology")).unwrap();
        assert_eq!(json, "\"Technology\"");
    }
}

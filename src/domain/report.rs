use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingStats {
    /// Seconds.
    pub total_reading_time: u64,
    pub articles_read: usize,
    pub articles_completed: usize,
    pub category_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub summary: String,
    pub articles_read: usize,
    pub minutes_spent: u64,
    pub top_category: Option<String>,
    /// Percentage, rounded.
    pub completion_rate: u32,
}

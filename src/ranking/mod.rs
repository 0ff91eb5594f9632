pub mod aggregator;
pub mod cache;
pub mod relevance;
pub mod scorer;

pub use aggregator::{AffinityAggregator, AffinitySource};
pub use cache::AffinityCache;
pub use relevance::category_relevance;
pub use scorer::{ArticleScorer, ScoreBreakdown};

pub mod assembler;
pub mod engagement;
pub mod insights;

pub use assembler::{FeedAssembler, FeedFilters};
pub use engagement::EngagementRecorder;
pub use insights::ReadingInsights;

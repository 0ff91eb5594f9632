pub mod affinity;
pub mod article;
pub mod catalog;
pub mod engagement;
pub mod report;
pub mod user;

pub use affinity::AffinityProfile;
pub use article::{Article, ArticleQuery};
pub use engagement::{
    CommentRecord, InteractionAction, LikeRecord, Poll, PollVoteRecord, ReadingHistoryEntry,
    RelevanceFeedback,
};
pub use report::{ReadingStats, WeeklyReport};
pub use user::{Category, User};

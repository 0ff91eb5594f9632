#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod observability;
pub mod port;
pub mod ranking;
pub mod test_support;

pub use app::ComponentRegistry;
pub use config::Config;
pub use error::{CacheError, FeedError};
pub use feed::{EngagementRecorder, FeedAssembler, FeedFilters, ReadingInsights};

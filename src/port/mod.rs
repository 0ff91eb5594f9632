pub mod cache_store;
pub mod clock;
pub mod document_store;

pub use cache_store::CacheStore;
pub use clock::{Clock, SystemClock};
pub use document_store::{ArticleCounter, DocumentStore};

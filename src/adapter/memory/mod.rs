mod cache;
mod store;

pub use cache::InMemoryCacheStore;
pub use store::InMemoryDocumentStore;

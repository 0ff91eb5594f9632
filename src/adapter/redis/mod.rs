mod cache;

pub use cache::RedisCacheStore;

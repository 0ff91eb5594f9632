use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("document store operation `{operation}` failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("article not found: {0}")]
    ArticleNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FeedError {
    pub fn store(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        FeedError::Store {
            operation,
            source: source.into(),
        }
    }
}

/// Failures of the shared cache backend. Callers on the read path treat
/// every variant as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache backend timed out")]
    Timeout,

    #[error("cached value could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_operation() {
        let err = FeedError::store("reading_history", anyhow::anyhow!("connection reset"));
        let rendered = err.to_string();
        assert!(rendered.contains("reading_history"));
        assert!(rendered.contains("connection reset"));
    }

    #[test]
    fn undecodable_cache_value_converts_to_codec_error() {
        let decode = serde_json::from_slice::<u32>(b"not json").unwrap_err();
        let err = CacheError::from(decode);
        assert!(matches!(err, CacheError::Codec(_)));
        assert!(err.to_string().starts_with("cached value could not be decoded"));
    }
}

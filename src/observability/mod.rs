pub mod metrics;
pub mod tracing;

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};

use self::metrics::FeedMetrics;

/// Owns the metrics registry and the feed collectors registered in it.
#[derive(Debug, Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    metrics: Arc<FeedMetrics>,
}

impl Telemetry {
    /// Initializes tracing and registers the feed metrics.
    ///
    /// # Errors
    /// Fails when the subscriber or metric registration fails.
    pub fn new() -> Result<Self> {
        tracing::init()?;
        Self::without_subscriber()
    }

    /// Registers metrics only; for embedders that install their own subscriber.
    ///
    /// # Errors
    /// Fails when metric registration fails.
    pub fn without_subscriber() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(FeedMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    #[must_use]
    pub fn metrics(&self) -> &FeedMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn metrics_arc(&self) -> Arc<FeedMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Text exposition of every collector in this registry.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&families, &mut buffer) {
            ::tracing::warn!(error = %err, "failed to encode prometheus metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

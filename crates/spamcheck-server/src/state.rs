//! Shared application state

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use moka::sync::Cache;
use spamcheck_classifiers::{ServiceStatus, SpamClassificationService};
use spamcheck_telemetry::{HistoryEntry, HistoryStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Rendered history listings, keyed by limit
pub type HistoryCache = Cache<usize, Arc<Vec<HistoryEntry>>>;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Classification pipeline and artifact lifecycle
    pub service: Arc<SpamClassificationService>,

    /// Recorded classifications
    pub history: Arc<HistoryStore>,

    /// Reuse of recent history listings (None when disabled)
    pub history_cache: Option<HistoryCache>,

    /// Per-client limit on classify requests
    pub rate_limiter: Arc<RateLimiter>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the state from configuration, loading the model artifacts.
    ///
    /// Missing or broken artifacts leave the service unready rather than
    /// failing; an unusable history file falls back to in-memory history.
    pub fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Self {
        info!("Initializing application state");

        let service = SpamClassificationService::new(config.model.clone());
        match service.initialize() {
            ServiceStatus::Ready => info!(
                "Classifier ready: {}",
                service.model_name().unwrap_or("unknown")
            ),
            status => warn!(
                "Classifier not ready ({:?}): {}",
                status,
                service.unready_reason().unwrap_or("no reason given")
            ),
        }

        let history = match HistoryStore::open(config.history.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!("Failed to open classification history, keeping it in memory: {}", e);
                HistoryStore::in_memory(config.history.clone())
            }
        };

        Self::from_parts(config, service, history, metrics_handle)
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: ServerConfig,
        service: SpamClassificationService,
        history: HistoryStore,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let history_cache = (config.history.cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(config.history.cache_ttl_secs))
                .build()
        });
        let rate_limiter = RateLimiter::per_minute(config.rate_limit.requests_per_minute);

        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            history: Arc::new(history),
            history_cache,
            rate_limiter: Arc::new(rate_limiter),
            metrics_handle,
        }
    }

    /// Most recent history entries, served from the listing cache when fresh
    pub fn recent_history(&self) -> Arc<Vec<HistoryEntry>> {
        let limit = self.config.history.limit;
        match &self.history_cache {
            Some(cache) => cache.get_with(limit, || Arc::new(self.history.recent(limit))),
            None => Arc::new(self.history.recent(limit)),
        }
    }
}

//! Spam classification service
//!
//! Owns the artifact lifecycle and exposes `predict`. The service is built
//! explicitly and shared behind an `Arc`; there is no global instance.
//!
//! Lifecycle: `Uninitialized` until `initialize()` runs, then `Ready` or
//! `Unready` for the rest of the process. A failed load never aborts
//! startup; every prediction on an unready service returns `Unknown`.

use crate::cache::PredictionCache;
use crate::classifier::decide;
use crate::config::ModelConfig;
use crate::model_loader::{load_artifacts, LoadedModel};
use crate::normalizer::TextNormalizer;
use spamcheck_core::{Error, PredictionResult, RawText, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Uninitialized,
    Ready,
    Unready,
}

enum Readiness {
    Ready(LoadedModel),
    Unready(String),
}

pub struct SpamClassificationService {
    config: ModelConfig,
    normalizer: TextNormalizer,
    cache: PredictionCache,
    state: OnceLock<Readiness>,
}

impl SpamClassificationService {
    /// Create an uninitialized service
    pub fn new(config: ModelConfig) -> Self {
        let normalizer = TextNormalizer::from_config(&config.preprocessing);
        let ttl = (config.cache_ttl_secs > 0).then(|| Duration::from_secs(config.cache_ttl_secs));
        let cache = PredictionCache::new(config.cache_capacity, ttl);

        Self {
            config,
            normalizer,
            cache,
            state: OnceLock::new(),
        }
    }

    /// Create a service that is ready with an already-loaded model
    pub fn with_model(config: ModelConfig, model: LoadedModel) -> Self {
        let service = Self::new(config);
        let installed = service.state.set(Readiness::Ready(model)).is_ok();
        debug_assert!(installed);
        service
    }

    /// Load the artifacts. Runs once; later calls return the existing status.
    pub fn initialize(&self) -> ServiceStatus {
        if self.state.get().is_some() {
            warn!("Classification service already initialized");
            return self.status();
        }

        self.state.get_or_init(|| match load_artifacts(&self.config, &self.normalizer) {
            Ok(model) => {
                info!(
                    "ML model loaded successfully ({}, {} features)",
                    model.model_name(),
                    model.vectorizer.dimension()
                );
                Readiness::Ready(model)
            }
            Err(e) => {
                error!("Error loading ML model: {}", e);
                Readiness::Unready(e.to_string())
            }
        });

        self.status()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.state.get() {
            None => ServiceStatus::Uninitialized,
            Some(Readiness::Ready(_)) => ServiceStatus::Ready,
            Some(Readiness::Unready(_)) => ServiceStatus::Unready,
        }
    }

    /// True iff both the classifier and the vocabulary are loaded
    pub fn is_ready(&self) -> bool {
        self.status() == ServiceStatus::Ready
    }

    /// Why loading failed, when it did
    pub fn unready_reason(&self) -> Option<&str> {
        match self.state.get() {
            Some(Readiness::Unready(reason)) => Some(reason),
            _ => None,
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        match self.state.get() {
            Some(Readiness::Ready(model)) => Some(model.model_name()),
            _ => None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn max_text_chars(&self) -> usize {
        self.config.max_text_chars
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }

    /// Classify validated text.
    ///
    /// Not ready: `Unknown` with confidence 0.0, no inference attempted.
    /// A fault inside the pipeline (including a panic) becomes `Error::Internal`.
    pub fn predict(&self, text: &RawText) -> Result<PredictionResult> {
        let model = match self.state.get() {
            Some(Readiness::Ready(model)) => model,
            _ => return Ok(PredictionResult::not_loaded()),
        };

        self.cache
            .get_or_compute(text.as_str(), |raw| self.run_pipeline(model, raw))
    }

    fn run_pipeline(&self, model: &LoadedModel, raw: &str) -> Result<PredictionResult> {
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let tokens = self.normalizer.normalize(raw);
            let features = model.vectorizer.transform(&tokens);
            let decision = decide(model.classifier.as_ref(), &features);
            debug!(
                "Classified {} tokens ({} features) as class {}",
                tokens.len(),
                features.nnz(),
                decision.class
            );
            decision
        }));

        let decision = outcome.map_err(|_| {
            error!("Error in prediction: inference panicked");
            metrics::counter!("spamcheck_errors_total", "kind" => "inference").increment(1);
            Error::internal("inference panicked")
        })?;

        let latency_us = start.elapsed().as_micros() as u64;
        metrics::histogram!("spamcheck_inference_latency_us").record(latency_us as f64);

        let result = PredictionResult::classified(decision.label(), decision.confidence);
        metrics::counter!("spamcheck_predictions_total", "label" => result.label.as_str())
            .increment(1);
        Ok(result)
    }
}

impl std::fmt::Debug for SpamClassificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpamClassificationService")
            .field("status", &self.status())
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

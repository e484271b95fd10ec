//! Fixtures and mock models for testing
//!
//! Provides a small fitted vocabulary, a hand-weighted logistic model that
//! separates the fixture corpus, and configurable mock implementations of
//! the DecisionModel trait for exercising the service's error paths.

#![allow(dead_code)]

use spamcheck_classifiers::{
    ClassifierArtifact, ClassifierModel, DecisionModel, FeatureVector, LoadedModel,
    LogisticRegression, ModelConfig, TextNormalizer, TfidfVectorizer, VectorizerOptions,
};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const SPAM_DOCS: &[&str] = &[
    "Buy now! Limited time offer",
    "Selamat! Anda memenangkan hadiah pulsa gratis, klik link ini",
    "Claim your free prize now, limited offer",
    "Dapatkan promo diskon besar hari ini juga",
];

pub const HAM_DOCS: &[&str] = &[
    "Hello, how are you today?",
    "Nanti malam kita makan bersama di rumah ibu",
    "Are you coming to the meeting today",
    "Jangan lupa bawa bukunya besok pagi",
];

pub const SPAM_TERMS: &[&str] = &[
    "buy", "limited", "offer", "time", "claim", "free", "prize", "hadiah", "pulsa",
    "gratis", "klik", "link", "dapat", "promo", "diskon",
];

pub const HAM_TERMS: &[&str] = &[
    "hello", "how", "are", "you", "today", "malam", "makan", "sama", "rumah", "ibu", "coming",
    "meeting", "jangan", "lupa", "bawa", "buku", "besok", "pagi",
];

pub fn corpus() -> Vec<&'static str> {
    SPAM_DOCS.iter().chain(HAM_DOCS.iter()).copied().collect()
}

/// Vocabulary fitted on the fixture corpus with default options
pub fn fitted_vectorizer() -> TfidfVectorizer {
    TfidfVectorizer::fit(&corpus(), &TextNormalizer::default(), VectorizerOptions::default())
        .expect("fixture corpus fits")
}

/// Logistic model: positive weight on spam terms, negative on ham terms
pub fn logistic_model(vectorizer: &TfidfVectorizer) -> ClassifierModel {
    let mut coef = vec![0.0; vectorizer.dimension()];
    for term in SPAM_TERMS {
        if let Some(i) = vectorizer.index_of(term) {
            coef[i] = 4.0;
        }
    }
    for term in HAM_TERMS {
        if let Some(i) = vectorizer.index_of(term) {
            coef[i] = -4.0;
        }
    }
    ClassifierModel::LogisticRegression(LogisticRegression {
        coef,
        intercept: -0.25,
    })
}

pub fn loaded_model() -> LoadedModel {
    let vectorizer = fitted_vectorizer();
    let classifier = logistic_model(&vectorizer);
    LoadedModel::new(vectorizer, Arc::new(classifier)).expect("dimensions agree")
}

/// Write vocabulary.json and classifier.json into `dir`
pub fn write_artifacts(dir: &Path) -> ModelConfig {
    let vectorizer = fitted_vectorizer();
    let classifier = logistic_model(&vectorizer);
    vectorizer.save(dir.join("vocabulary.json")).unwrap();
    ClassifierArtifact::new(classifier)
        .save(dir.join("classifier.json"))
        .unwrap();
    ModelConfig::with_dir(dir)
}

/// A configurable mock model for testing
pub struct MockModel {
    dimension: usize,
    class: u8,
    proba: Option<[f64; 2]>,
    margin: Option<f64>,
    call_count: AtomicU32,
}

impl MockModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            class: 0,
            proba: None,
            margin: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the class this model will return
    pub fn with_class(mut self, class: u8) -> Self {
        self.class = class;
        self
    }

    pub fn with_proba(mut self, proba: [f64; 2]) -> Self {
        self.proba = Some(proba);
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Get the number of times the model was asked for a class
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl DecisionModel for MockModel {
    fn predict_class(&self, _features: &FeatureVector) -> u8 {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.class
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Option<[f64; 2]> {
        self.proba
    }

    fn decision_function(&self, _features: &FeatureVector) -> Option<f64> {
        self.margin
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A model that panics on every call - for testing the fault boundary
pub struct PanickingModel {
    dimension: usize,
}

impl PanickingModel {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl DecisionModel for PanickingModel {
    fn predict_class(&self, _features: &FeatureVector) -> u8 {
        panic!("simulated model fault");
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

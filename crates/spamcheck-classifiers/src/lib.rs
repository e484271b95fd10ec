//! spamcheck Classifiers
//!
//! The text classification pipeline for short-message spam detection:
//!
//! - [`normalizer`]: tokenize, stem, lower-case, drop stop words
//! - [`vectorizer`]: TF-IDF weighting over a vocabulary fixed at fit time
//! - [`classifier`]: pre-trained binary decision models and the confidence policy
//! - [`cache`]: bounded memoization keyed by exact input text
//! - [`service`]: artifact lifecycle and the `predict` entry point
//!
//! Everything runs synchronously on the calling thread; the only shared
//! mutable state is the prediction cache.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod model_loader;
pub mod normalizer;
pub mod service;
pub mod stemmer;
pub mod stopwords;
pub mod vectorizer;

pub use cache::PredictionCache;
pub use classifier::{
    decide, ClassifierArtifact, ClassifierModel, Decision, DecisionModel, LinearSvc,
    LogisticRegression, MultinomialNb, NearestCentroid,
};
pub use config::{ModelConfig, PreprocessingConfig, StemmerKind};
pub use model_loader::{load_artifacts, load_corpus, LoadedModel};
pub use normalizer::TextNormalizer;
pub use service::{ServiceStatus, SpamClassificationService};
pub use stemmer::{IdentityStemmer, IndonesianStemmer, Stemmer};
pub use stopwords::StopWords;
pub use vectorizer::{FeatureVector, Norm, TfidfVectorizer, VectorizerOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassifierModel, DecisionModel};
    pub use crate::config::ModelConfig;
    pub use crate::normalizer::TextNormalizer;
    pub use crate::service::{ServiceStatus, SpamClassificationService};
    pub use crate::vectorizer::{FeatureVector, TfidfVectorizer};
}

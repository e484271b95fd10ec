//! Loading the vocabulary and classifier artifacts

use crate::classifier::{ClassifierArtifact, DecisionModel};
use crate::config::ModelConfig;
use crate::normalizer::TextNormalizer;
use crate::vectorizer::{TfidfVectorizer, VectorizerOptions};
use spamcheck_core::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Vocabulary and classifier, loaded together and immutable afterwards
#[derive(Clone)]
pub struct LoadedModel {
    pub vectorizer: Arc<TfidfVectorizer>,
    pub classifier: Arc<dyn DecisionModel>,
}

impl LoadedModel {
    /// Pair a vectorizer with a classifier, checking that their dimensions agree
    pub fn new(vectorizer: TfidfVectorizer, classifier: Arc<dyn DecisionModel>) -> Result<Self> {
        if vectorizer.dimension() != classifier.dimension() {
            return Err(Error::artifact(format!(
                "classifier expects {} features but vocabulary has {} terms",
                classifier.dimension(),
                vectorizer.dimension()
            )));
        }
        Ok(Self {
            vectorizer: Arc::new(vectorizer),
            classifier,
        })
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("classifier", &self.classifier.name())
            .field("dimension", &self.vectorizer.dimension())
            .finish()
    }
}

/// Load both artifacts described by `config`.
///
/// The vocabulary comes from the fitted artifact when present; otherwise it
/// is fitted from the configured training corpus.
pub fn load_artifacts(config: &ModelConfig, normalizer: &TextNormalizer) -> Result<LoadedModel> {
    let classifier_path = config.classifier_path();
    if !classifier_path.exists() {
        return Err(Error::artifact(format!(
            "classifier artifact not found: {}",
            classifier_path.display()
        )));
    }
    let classifier = ClassifierArtifact::load(&classifier_path)?;
    info!(
        "Loaded {} classifier from {}",
        classifier.name(),
        classifier_path.display()
    );

    let vectorizer = load_vectorizer(config, normalizer)?;

    LoadedModel::new(vectorizer, Arc::new(classifier))
}

fn load_vectorizer(config: &ModelConfig, normalizer: &TextNormalizer) -> Result<TfidfVectorizer> {
    let vocabulary_path = config.vocabulary_path();
    if vocabulary_path.exists() {
        let vectorizer = TfidfVectorizer::load(&vocabulary_path)?;
        info!(
            "Loaded vocabulary ({} terms) from {}",
            vectorizer.dimension(),
            vocabulary_path.display()
        );
        return Ok(vectorizer);
    }

    match config.corpus_path() {
        Some(corpus_path) if corpus_path.exists() => {
            warn!(
                "Vocabulary artifact {} not found, fitting from corpus {}",
                vocabulary_path.display(),
                corpus_path.display()
            );
            let corpus = load_corpus(&corpus_path)?;
            TfidfVectorizer::fit(&corpus, normalizer, VectorizerOptions::default())
        }
        Some(corpus_path) => Err(Error::artifact(format!(
            "neither vocabulary {} nor corpus {} exists",
            vocabulary_path.display(),
            corpus_path.display()
        ))),
        None => Err(Error::artifact(format!(
            "vocabulary artifact not found: {}",
            vocabulary_path.display()
        ))),
    }
}

/// Read a training corpus: a JSON array of strings, or one document per line
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierModel, LinearSvc};
    use tempfile::TempDir;

    fn write_classifier(dir: &Path, dim: usize) {
        let artifact = ClassifierArtifact::new(ClassifierModel::LinearSvc(LinearSvc {
            coef: vec![1.0; dim],
            intercept: -0.5,
        }));
        artifact.save(dir.join("classifier.json")).unwrap();
    }

    #[test]
    fn test_missing_classifier() {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig::with_dir(dir.path());
        let err = load_artifacts(&config, &TextNormalizer::default()).unwrap_err();
        assert!(err.to_string().contains("classifier artifact not found"));
    }

    #[test]
    fn test_fit_from_corpus_when_vocabulary_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("corpus.txt"),
            "gratis pulsa sekarang\n\nhalo apa kabar\n",
        )
        .unwrap();
        // gratis, pulsa, sekarang, halo, apa, kabar
        write_classifier(dir.path(), 6);

        let mut config = ModelConfig::with_dir(dir.path());
        config.corpus = Some("corpus.txt".into());

        let model = load_artifacts(&config, &TextNormalizer::default()).unwrap();
        assert_eq!(model.vectorizer.dimension(), 6);
        assert_eq!(model.vectorizer.document_count(), 2);
        assert_eq!(model.model_name(), "linear_svc");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("corpus.json"), r#"["gratis pulsa", "halo"]"#).unwrap();
        write_classifier(dir.path(), 5);

        let mut config = ModelConfig::with_dir(dir.path());
        config.corpus = Some("corpus.json".into());

        let err = load_artifacts(&config, &TextNormalizer::default()).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn test_corrupt_classifier() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("classifier.json"), "not json").unwrap();
        let config = ModelConfig::with_dir(dir.path());
        let err = load_artifacts(&config, &TextNormalizer::default()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_load_corpus_formats() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"["a b", "c"]"#).unwrap();
        assert_eq!(load_corpus(&json).unwrap(), vec!["a b", "c"]);

        let lines = dir.path().join("c.txt");
        std::fs::write(&lines, "  a b \n\nc\n").unwrap();
        assert_eq!(load_corpus(&lines).unwrap(), vec!["a b", "c"]);
    }
}

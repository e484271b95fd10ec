//! Configuration for preprocessing and model loading

use serde::{Deserialize, Serialize};
use spamcheck_core::DEFAULT_MAX_TEXT_CHARS;
use std::path::{Path, PathBuf};

/// Configuration for the classification service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the model artifacts
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    /// Classifier artifact file, relative to `dir`
    #[serde(default = "default_classifier_file")]
    pub classifier: PathBuf,

    /// Fitted vocabulary artifact file, relative to `dir`
    #[serde(default = "default_vocabulary_file")]
    pub vocabulary: PathBuf,

    /// Training corpus used to fit the vocabulary at startup when the
    /// vocabulary artifact is absent
    #[serde(default)]
    pub corpus: Option<PathBuf>,

    /// Maximum accepted input length, in characters
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Maximum number of memoized predictions
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Time-to-live for memoized predictions (0 = no expiry)
    #[serde(default)]
    pub cache_ttl_secs: u64,

    /// Text preprocessing settings
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            classifier: default_classifier_file(),
            vocabulary: default_vocabulary_file(),
            corpus: None,
            max_text_chars: default_max_text_chars(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: 0,
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Config rooted at the given artifact directory, defaults elsewhere
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Resolved path of the classifier artifact
    pub fn classifier_path(&self) -> PathBuf {
        resolve(&self.dir, &self.classifier)
    }

    /// Resolved path of the vocabulary artifact
    pub fn vocabulary_path(&self) -> PathBuf {
        resolve(&self.dir, &self.vocabulary)
    }

    /// Resolved path of the training corpus, if configured
    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.corpus.as_ref().map(|c| resolve(&self.dir, c))
    }
}

/// Text preprocessing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Stemming algorithm
    #[serde(default)]
    pub stemmer: StemmerKind,

    /// Additional stop words on top of the built-in list
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
}

/// Stemming algorithm selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    /// Indonesian affix stripping
    #[default]
    Indonesian,
    /// Leave tokens untouched
    None,
}

fn resolve(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_classifier_file() -> PathBuf {
    PathBuf::from("classifier.json")
}

fn default_vocabulary_file() -> PathBuf {
    PathBuf::from("vocabulary.json")
}

fn default_max_text_chars() -> usize {
    DEFAULT_MAX_TEXT_CHARS
}

fn default_cache_capacity() -> u64 {
    1000
}

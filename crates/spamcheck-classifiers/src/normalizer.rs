//! Text normalization: tokenize, stem, lower-case, drop stop words

use crate::config::PreprocessingConfig;
use crate::stemmer::{build_stemmer, Stemmer};
use crate::stopwords::StopWords;
use regex::Regex;
use spamcheck_core::{Result, TokenSequence};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::error;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").expect("static word pattern is valid"))
}

/// Turns raw text into the token sequence the vectorizer consumes.
///
/// `normalize` never fails: if the stemmer errors or panics, the cause is
/// logged and an empty sequence is returned.
#[derive(Clone)]
pub struct TextNormalizer {
    stemmer: Arc<dyn Stemmer>,
    stop_words: Arc<StopWords>,
}

impl TextNormalizer {
    pub fn new(stemmer: Arc<dyn Stemmer>, stop_words: StopWords) -> Self {
        Self {
            stemmer,
            stop_words: Arc::new(stop_words),
        }
    }

    /// Build from preprocessing configuration
    pub fn from_config(config: &PreprocessingConfig) -> Self {
        Self::new(
            build_stemmer(config.stemmer),
            StopWords::indonesian(&config.extra_stop_words),
        )
    }

    pub fn stemmer_name(&self) -> &str {
        self.stemmer.name()
    }

    /// Normalize raw text into tokens
    pub fn normalize(&self, raw: &str) -> TokenSequence {
        match catch_unwind(AssertUnwindSafe(|| self.try_normalize(raw))) {
            Ok(Ok(tokens)) => tokens,
            Ok(Err(e)) => {
                error!("Error in preprocessing: {}", e);
                Vec::new()
            }
            Err(_) => {
                error!("Error in preprocessing: stemmer panicked");
                Vec::new()
            }
        }
    }

    fn try_normalize(&self, raw: &str) -> Result<TokenSequence> {
        let lowered = raw.to_lowercase();
        let mut tokens = Vec::new();

        for m in word_pattern().find_iter(&lowered) {
            let token = self.stemmer.stem(m.as_str())?.to_lowercase();
            if !token.is_empty() && !self.stop_words.contains(&token) {
                tokens.push(token);
            }
        }

        Ok(tokens)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::from_config(&PreprocessingConfig::default())
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("stemmer", &self.stemmer.name())
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}

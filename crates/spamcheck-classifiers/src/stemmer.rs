//! Stemmers
//!
//! The default stemmer reduces Indonesian words to their root by stripping
//! particles, possessive pronouns, derivational suffixes, and first/second
//! order prefixes (with the usual nasal recoding, e.g. `menulis` -> `tulis`).
//! It is purely rule based and works without a root dictionary.

use crate::config::StemmerKind;
use spamcheck_core::Result;
use std::sync::Arc;

/// Morphological reduction of a single lower-cased token
pub trait Stemmer: Send + Sync {
    /// Reduce `word` to its root form
    fn stem(&self, word: &str) -> Result<String>;

    /// Get the stemmer name
    fn name(&self) -> &str;
}

/// Build the stemmer selected in configuration
pub fn build_stemmer(kind: StemmerKind) -> Arc<dyn Stemmer> {
    match kind {
        StemmerKind::Indonesian => Arc::new(IndonesianStemmer::new()),
        StemmerKind::None => Arc::new(IdentityStemmer),
    }
}

/// Leaves tokens unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, word: &str) -> Result<String> {
        Ok(word.to_string())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Rule-based Indonesian affix stripper
#[derive(Debug, Clone, Copy)]
pub struct IndonesianStemmer {
    min_syllables: usize,
}

const PARTICLES: &[&str] = &["kah", "lah", "tah", "pun"];
const POSSESSIVES: &[&str] = &["nya", "ku", "mu"];
const DERIVATIONAL: &[&str] = &["kan", "an", "i"];

impl IndonesianStemmer {
    pub fn new() -> Self {
        Self { min_syllables: 2 }
    }

    fn stem_word(&self, word: &str) -> String {
        if word.len() <= 3 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }

        let mut w = word.to_string();
        w = self.strip_suffix(w, PARTICLES);
        w = self.strip_suffix(w, POSSESSIVES);

        match self.strip_first_order_prefix(&w) {
            Some(rest) => {
                w = self.strip_suffix(rest, DERIVATIONAL);
                if let Some(rest) = self.strip_second_order_prefix(&w) {
                    w = rest;
                }
            }
            None => {
                if let Some(rest) = self.strip_second_order_prefix(&w) {
                    w = rest;
                }
                w = self.strip_suffix(w, DERIVATIONAL);
            }
        }

        w
    }

    fn accept(&self, stem: &str) -> bool {
        syllables(stem) >= self.min_syllables
    }

    /// Remove the first matching suffix whose removal leaves a valid stem
    fn strip_suffix(&self, word: String, suffixes: &[&str]) -> String {
        for suffix in suffixes {
            if let Some(stem) = word.strip_suffix(suffix) {
                if self.accept(stem) {
                    return stem.to_string();
                }
            }
        }
        word
    }

    fn strip_first_order_prefix(&self, word: &str) -> Option<String> {
        let candidate = if let Some(rest) = word.strip_prefix("meng").or_else(|| word.strip_prefix("peng")) {
            rest.to_string()
        } else if let Some(rest) = word.strip_prefix("meny").or_else(|| word.strip_prefix("peny")) {
            if starts_with_vowel(rest) {
                format!("s{rest}")
            } else {
                rest.to_string()
            }
        } else if let Some(rest) = word.strip_prefix("men").or_else(|| word.strip_prefix("pen")) {
            if starts_with_vowel(rest) {
                format!("t{rest}")
            } else {
                rest.to_string()
            }
        } else if let Some(rest) = word.strip_prefix("mem").or_else(|| word.strip_prefix("pem")) {
            if starts_with_vowel(rest) {
                format!("p{rest}")
            } else {
                rest.to_string()
            }
        } else if let Some(rest) = word.strip_prefix("me") {
            // plain me- only precedes l, r, w, y and the nasals
            if !rest.starts_with(['l', 'r', 'w', 'y', 'm', 'n']) {
                return None;
            }
            rest.to_string()
        } else if let Some(rest) = word
            .strip_prefix("di")
            .or_else(|| word.strip_prefix("ter"))
            .or_else(|| word.strip_prefix("ke"))
        {
            rest.to_string()
        } else {
            return None;
        };

        self.accept(&candidate).then_some(candidate)
    }

    fn strip_second_order_prefix(&self, word: &str) -> Option<String> {
        let candidate = if word == "belajar" || word == "pelajar" {
            "ajar".to_string()
        } else if let Some(rest) = word.strip_prefix("ber").or_else(|| word.strip_prefix("per")) {
            rest.to_string()
        } else if let Some(rest) = word.strip_prefix("be") {
            // be- only before C + "er", as in bekerja -> kerja
            let bytes = rest.as_bytes();
            if bytes.len() > 3 && !is_vowel(bytes[0]) && &rest[1..3] == "er" {
                rest.to_string()
            } else {
                return None;
            }
        } else if let Some(rest) = word.strip_prefix("pe") {
            if starts_with_vowel(rest) {
                return None;
            }
            rest.to_string()
        } else {
            return None;
        };

        self.accept(&candidate).then_some(candidate)
    }
}

impl Default for IndonesianStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for IndonesianStemmer {
    fn stem(&self, word: &str) -> Result<String> {
        Ok(self.stem_word(word))
    }

    fn name(&self) -> &str {
        "indonesian"
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn starts_with_vowel(s: &str) -> bool {
    s.bytes().next().is_some_and(is_vowel)
}

fn syllables(s: &str) -> usize {
    s.bytes().filter(|b| is_vowel(*b)).count()
}

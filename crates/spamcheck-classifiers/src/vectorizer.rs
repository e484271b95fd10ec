//! TF-IDF feature extraction
//!
//! The vectorizer is fitted once from a reference corpus and is closed
//! afterwards: terms that were not seen at fit time contribute nothing, so
//! every transformed vector has the same dimension as the vocabulary.
//!
//! Weighting follows the common conventions:
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1` with smoothing, `ln(n / df(t)) + 1` without
//! - `tf` is the raw count, or `1 + ln(count)` when `sublinear_tf` is set
//! - each vector is scaled to unit L2 (or L1) norm unless `norm` is `none`

use crate::normalizer::TextNormalizer;
use serde::{Deserialize, Serialize};
use spamcheck_core::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Current vocabulary artifact format
pub const VOCABULARY_FORMAT_VERSION: u32 = 1;

/// Vector normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// Weighting options fixed at fit time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizerOptions {
    #[serde(default = "default_true")]
    pub smooth_idf: bool,

    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub norm: Norm,

    /// Drop terms that appear in fewer documents than this
    #[serde(default = "default_min_df")]
    pub min_df: usize,
}

impl Default for VectorizerOptions {
    fn default() -> Self {
        Self {
            smooth_idf: true,
            sublinear_tf: false,
            norm: Norm::L2,
            min_df: default_min_df(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_df() -> usize {
    1
}

/// Sparse feature vector with a fixed dimension
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dimension: usize,
    /// (index, weight) pairs sorted by index, weights non-zero
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// All-zero vector of the given dimension
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of non-zero weights
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Weight at `index` (zero when absent)
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense weight vector of the same dimension
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(i, w)| w * weights.get(*i).copied().unwrap_or(0.0))
            .sum()
    }

    /// Squared Euclidean distance to a dense point of the same dimension
    pub fn squared_distance(&self, point: &[f64]) -> f64 {
        let point_sq: f64 = point.iter().map(|p| p * p).sum();
        let self_sq: f64 = self.entries.iter().map(|(_, w)| w * w).sum();
        (point_sq + self_sq - 2.0 * self.dot(point)).max(0.0)
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for (i, w) in &self.entries {
            dense[*i] = *w;
        }
        dense
    }
}

/// Fitted TF-IDF vocabulary
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    options: VectorizerOptions,
    document_count: usize,
}

impl TfidfVectorizer {
    /// Fit on raw documents, normalizing each with `normalizer`
    pub fn fit<S: AsRef<str>>(
        corpus: &[S],
        normalizer: &TextNormalizer,
        options: VectorizerOptions,
    ) -> Result<Self> {
        let documents: Vec<Vec<String>> = corpus
            .iter()
            .map(|doc| normalizer.normalize(doc.as_ref()))
            .collect();
        Self::fit_tokens(&documents, options)
    }

    /// Fit on already-normalized documents
    pub fn fit_tokens(documents: &[Vec<String>], options: VectorizerOptions) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::classifier("cannot fit vocabulary on an empty corpus"));
        }

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in documents {
            let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::new();
        let mut idf = Vec::new();

        // BTreeMap iteration gives the sorted term order used for indices
        for (term, df) in doc_freq {
            if df < options.min_df {
                continue;
            }
            vocabulary.insert(term.to_string(), idf.len());
            idf.push(idf_weight(n, df as f64, options.smooth_idf));
        }

        if vocabulary.is_empty() {
            return Err(Error::classifier(
                "empty vocabulary; the corpus may only contain stop words",
            ));
        }

        info!(
            "Fitted TF-IDF vocabulary: {} terms from {} documents",
            vocabulary.len(),
            documents.len()
        );

        Ok(Self {
            vocabulary,
            idf,
            options,
            document_count: documents.len(),
        })
    }

    /// Vocabulary size, which is also the dimension of every output vector
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn options(&self) -> &VectorizerOptions {
        &self.options
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Index of a term, if it is in the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.idf[i])
    }

    /// Weight a normalized token sequence
    pub fn transform(&self, tokens: &[String]) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| {
                let tf = if self.options.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                (idx, tf * self.idf[idx])
            })
            .collect();
        entries.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = match self.options.norm {
            Norm::L2 => entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Norm::L1 => entries.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }

        debug!(
            "Transformed {} tokens into {} non-zero features",
            tokens.len(),
            entries.len()
        );

        FeatureVector {
            dimension: self.dimension(),
            entries,
        }
    }

    /// Serializable form of the fitted vocabulary
    pub fn to_artifact(&self) -> VocabularyArtifact {
        VocabularyArtifact {
            format_version: VOCABULARY_FORMAT_VERSION,
            vocabulary: self
                .vocabulary
                .iter()
                .map(|(t, i)| (t.clone(), *i))
                .collect(),
            idf: self.idf.clone(),
            options: self.options,
            document_count: self.document_count,
        }
    }

    /// Rebuild from a deserialized artifact, validating its shape
    pub fn from_artifact(artifact: VocabularyArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(Self {
            vocabulary: artifact.vocabulary.into_iter().collect(),
            idf: artifact.idf,
            options: artifact.options,
            document_count: artifact.document_count,
        })
    }

    /// Read a vocabulary artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let artifact: VocabularyArtifact = serde_json::from_str(&content)?;
        Self::from_artifact(artifact)
    }

    /// Write the vocabulary artifact to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_artifact())?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

fn idf_weight(n: f64, df: f64, smooth: bool) -> f64 {
    if smooth {
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    } else {
        (n / df).ln() + 1.0
    }
}

/// On-disk vocabulary format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyArtifact {
    pub format_version: u32,

    /// term -> feature index
    pub vocabulary: BTreeMap<String, usize>,

    /// IDF weight per feature index
    pub idf: Vec<f64>,

    #[serde(default)]
    pub options: VectorizerOptions,

    #[serde(default)]
    pub document_count: usize,
}

impl VocabularyArtifact {
    fn validate(&self) -> Result<()> {
        if self.format_version != VOCABULARY_FORMAT_VERSION {
            return Err(Error::artifact(format!(
                "unsupported vocabulary format version {} (expected {})",
                self.format_version, VOCABULARY_FORMAT_VERSION
            )));
        }
        if self.vocabulary.is_empty() {
            return Err(Error::artifact("vocabulary is empty"));
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(Error::artifact(format!(
                "vocabulary has {} terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }

        let mut seen = vec![false; self.idf.len()];
        for (term, &idx) in &self.vocabulary {
            if idx >= seen.len() || std::mem::replace(&mut seen[idx], true) {
                return Err(Error::artifact(format!(
                    "term '{}' has invalid or duplicate index {}",
                    term, idx
                )));
            }
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(Error::artifact("idf weights must be finite"));
        }
        Ok(())
    }
}

//! Pre-trained binary decision models and the confidence policy
//!
//! Models are loaded from a versioned JSON artifact. Which confidence a
//! prediction carries depends on what the loaded model can provide:
//! class probabilities win, then a signed decision margin, otherwise none.

use crate::vectorizer::FeatureVector;
use serde::{Deserialize, Serialize};
use spamcheck_core::{Error, Label, Result};
use std::path::Path;

/// Current classifier artifact format
pub const CLASSIFIER_FORMAT_VERSION: u32 = 1;

/// Trait for all pre-trained decision models
pub trait DecisionModel: Send + Sync {
    /// Predicted class: 1 for spam, 0 for not spam
    fn predict_class(&self, features: &FeatureVector) -> u8;

    /// Class probabilities `[p(0), p(1)]`, if the model exposes them
    fn predict_proba(&self, _features: &FeatureVector) -> Option<[f64; 2]> {
        None
    }

    /// Signed distance to the decision boundary, if the model exposes it
    fn decision_function(&self, _features: &FeatureVector) -> Option<f64> {
        None
    }

    /// Number of input features the model expects
    fn dimension(&self) -> usize;

    /// Get the model name
    fn name(&self) -> &str;
}

/// A label decision with its confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub class: u8,
    pub confidence: Option<f64>,
}

impl Decision {
    pub fn label(&self) -> Label {
        Label::from_class(self.class)
    }
}

/// Run the model and derive confidence from its capabilities
pub fn decide(model: &dyn DecisionModel, features: &FeatureVector) -> Decision {
    let class = model.predict_class(features);
    let confidence = if let Some(proba) = model.predict_proba(features) {
        Some(proba[0].max(proba[1]))
    } else {
        model.decision_function(features).map(f64::abs)
    };
    Decision { class, confidence }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Logistic regression: exposes probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl DecisionModel for LogisticRegression {
    fn predict_class(&self, features: &FeatureVector) -> u8 {
        u8::from(features.dot(&self.coef) + self.intercept > 0.0)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Option<[f64; 2]> {
        let p = sigmoid(features.dot(&self.coef) + self.intercept);
        Some([1.0 - p, p])
    }

    fn decision_function(&self, features: &FeatureVector) -> Option<f64> {
        Some(features.dot(&self.coef) + self.intercept)
    }

    fn dimension(&self) -> usize {
        self.coef.len()
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

/// Linear support vector classifier: exposes a decision margin only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvc {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl DecisionModel for LinearSvc {
    fn predict_class(&self, features: &FeatureVector) -> u8 {
        u8::from(features.dot(&self.coef) + self.intercept > 0.0)
    }

    fn decision_function(&self, features: &FeatureVector) -> Option<f64> {
        Some(features.dot(&self.coef) + self.intercept)
    }

    fn dimension(&self) -> usize {
        self.coef.len()
    }

    fn name(&self) -> &str {
        "linear_svc"
    }
}

/// Multinomial naive Bayes: exposes probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// log p(class)
    pub class_log_prior: [f64; 2],
    /// log p(feature | class), one row per class
    pub feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNb {
    fn joint_log_likelihood(&self, features: &FeatureVector) -> [f64; 2] {
        [
            self.class_log_prior[0] + features.dot(&self.feature_log_prob[0]),
            self.class_log_prior[1] + features.dot(&self.feature_log_prob[1]),
        ]
    }
}

impl DecisionModel for MultinomialNb {
    fn predict_class(&self, features: &FeatureVector) -> u8 {
        let jll = self.joint_log_likelihood(features);
        u8::from(jll[1] > jll[0])
    }

    fn predict_proba(&self, features: &FeatureVector) -> Option<[f64; 2]> {
        let jll = self.joint_log_likelihood(features);
        let max = jll[0].max(jll[1]);
        let e0 = (jll[0] - max).exp();
        let e1 = (jll[1] - max).exp();
        let total = e0 + e1;
        Some([e0 / total, e1 / total])
    }

    fn dimension(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    fn name(&self) -> &str {
        "multinomial_nb"
    }
}

/// Nearest centroid: label only, no confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub centroids: [Vec<f64>; 2],
}

impl DecisionModel for NearestCentroid {
    fn predict_class(&self, features: &FeatureVector) -> u8 {
        let d0 = features.squared_distance(&self.centroids[0]);
        let d1 = features.squared_distance(&self.centroids[1]);
        u8::from(d1 < d0)
    }

    fn dimension(&self) -> usize {
        self.centroids[0].len()
    }

    fn name(&self) -> &str {
        "nearest_centroid"
    }
}

/// Model families that can be deserialized from an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression(LogisticRegression),
    LinearSvc(LinearSvc),
    MultinomialNb(MultinomialNb),
    NearestCentroid(NearestCentroid),
}

impl ClassifierModel {
    fn inner(&self) -> &dyn DecisionModel {
        match self {
            Self::LogisticRegression(m) => m,
            Self::LinearSvc(m) => m,
            Self::MultinomialNb(m) => m,
            Self::NearestCentroid(m) => m,
        }
    }

    /// Every weight row must match the model dimension and be finite
    fn validate(&self) -> Result<()> {
        let rows: Vec<&[f64]> = match self {
            Self::LogisticRegression(m) => vec![m.coef.as_slice()],
            Self::LinearSvc(m) => vec![m.coef.as_slice()],
            Self::MultinomialNb(m) => vec![
                m.feature_log_prob[0].as_slice(),
                m.feature_log_prob[1].as_slice(),
                m.class_log_prior.as_slice(),
            ],
            Self::NearestCentroid(m) => {
                vec![m.centroids[0].as_slice(), m.centroids[1].as_slice()]
            }
        };

        let dim = self.dimension();
        if dim == 0 {
            return Err(Error::artifact(format!("{} has no weights", self.name())));
        }
        let weight_rows = match self {
            Self::MultinomialNb(_) => &rows[..2],
            _ => &rows[..],
        };
        if weight_rows.iter().any(|r| r.len() != dim) {
            return Err(Error::artifact(format!(
                "{} weight rows have inconsistent lengths",
                self.name()
            )));
        }
        if rows.iter().flat_map(|r| r.iter()).any(|w| !w.is_finite()) {
            return Err(Error::artifact(format!("{} weights must be finite", self.name())));
        }
        Ok(())
    }
}

impl DecisionModel for ClassifierModel {
    fn predict_class(&self, features: &FeatureVector) -> u8 {
        self.inner().predict_class(features)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Option<[f64; 2]> {
        self.inner().predict_proba(features)
    }

    fn decision_function(&self, features: &FeatureVector) -> Option<f64> {
        self.inner().decision_function(features)
    }

    fn dimension(&self) -> usize {
        self.inner().dimension()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// On-disk classifier format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    pub model: ClassifierModel,
}

impl ClassifierArtifact {
    pub fn new(model: ClassifierModel) -> Self {
        Self {
            format_version: CLASSIFIER_FORMAT_VERSION,
            model,
        }
    }

    /// Validate and unwrap the model
    pub fn into_model(self) -> Result<ClassifierModel> {
        if self.format_version != CLASSIFIER_FORMAT_VERSION {
            return Err(Error::artifact(format!(
                "unsupported classifier format version {} (expected {})",
                self.format_version, CLASSIFIER_FORMAT_VERSION
            )));
        }
        self.model.validate()?;
        Ok(self.model)
    }

    /// Read and validate a classifier artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<ClassifierModel> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let artifact: ClassifierArtifact = serde_json::from_str(&content)?;
        artifact.into_model()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

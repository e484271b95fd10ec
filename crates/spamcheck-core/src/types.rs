//! Core types for spamcheck

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of normalized tokens derived from raw text.
///
/// An empty sequence is valid and must flow through every stage.
pub type TokenSequence = Vec<String>;

/// Classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Message is spam (class 1)
    Spam,
    /// Message is not spam (class 0)
    NotSpam,
    /// No model available to decide
    Unknown,
}

impl Label {
    /// Map a binary class index to a label. 1 is spam, everything else is not.
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::Spam
        } else {
            Self::NotSpam
        }
    }

    /// Wire name of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::NotSpam => "not_spam",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable message for the label
    pub fn message(&self) -> &'static str {
        match self {
            Self::Spam => "This message is SPAM",
            Self::NotSpam => "This message is not SPAM",
            Self::Unknown => "Unable to classify this message",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(Self::Spam),
            "not_spam" => Ok(Self::NotSpam),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown label: {other}")),
        }
    }
}

/// Result of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted label
    #[serde(rename = "prediction")]
    pub label: Label,

    /// Confidence score, when the model can provide one
    pub confidence: Option<f64>,

    /// Human-readable description of the prediction
    pub message: String,
}

impl PredictionResult {
    /// Result for a label decided by a loaded model
    pub fn classified(label: Label, confidence: Option<f64>) -> Self {
        Self {
            label,
            confidence,
            message: label.message().to_string(),
        }
    }

    /// Result returned when the model artifacts are not available
    pub fn not_loaded() -> Self {
        Self {
            label: Label::Unknown,
            confidence: Some(0.0),
            message: "Model not loaded".to_string(),
        }
    }

    /// Whether this result came from a loaded model
    pub fn is_known(&self) -> bool {
        self.label != Label::Unknown
    }
}

/// Rejection of caller input at the boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required.")]
    Missing,

    #[error("Not a valid string.")]
    NotAString,

    #[error("This field may not be blank.")]
    Blank,

    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { max: usize },
}

/// Caller-supplied text that passed boundary validation.
///
/// Surrounding whitespace is stripped; the trimmed string is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawText(String);

impl RawText {
    /// Validate optional caller input.
    ///
    /// Blank and length checks apply to the trimmed text. Length is
    /// counted in characters, not bytes.
    pub fn parse(text: Option<String>, max_chars: usize) -> Result<Self, ValidationError> {
        let text = text.ok_or(ValidationError::Missing)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Blank);
        }
        if trimmed.chars().count() > max_chars {
            return Err(ValidationError::TooLong { max: max_chars });
        }
        if trimmed.len() == text.len() {
            Ok(Self(text))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Validate present caller input
    pub fn new(text: impl Into<String>, max_chars: usize) -> Result<Self, ValidationError> {
        Self::parse(Some(text.into()), max_chars)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for RawText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

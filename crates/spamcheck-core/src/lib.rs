//! spamcheck Core
//!
//! Core types and error handling shared across spamcheck components.
//!
//! This crate provides:
//! - The prediction label and result types returned by the classifier
//! - Boundary validation for raw caller text
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Label, PredictionResult, RawText, TokenSequence, ValidationError};

/// Default upper bound on raw text length, in characters
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5000;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Label, PredictionResult, RawText, TokenSequence};
}

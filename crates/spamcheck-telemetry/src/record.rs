//! Classification records and their anonymized listing view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use spamcheck_core::Label;
use std::net::IpAddr;

/// A classification as submitted for recording
#[derive(Debug, Clone)]
pub struct NewClassification {
    pub text_input: String,
    pub prediction: Label,
    pub confidence: Option<f64>,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl NewClassification {
    pub fn new(text_input: impl Into<String>, prediction: Label, confidence: Option<f64>) -> Self {
        Self {
            text_input: text_input.into(),
            prediction,
            confidence,
            client_ip: None,
            user_agent: None,
        }
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// A stored classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: u64,
    pub text_input: String,
    pub prediction: Label,
    pub confidence: Option<f64>,

    /// Client IP (hashed for privacy)
    pub ip_hash: Option<String>,

    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClassificationRecord {
    pub(crate) fn from_new(id: u64, new: NewClassification, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text_input: new.text_input,
            prediction: new.prediction,
            confidence: new.confidence,
            ip_hash: new.client_ip.map(hash_client_ip),
            user_agent: new.user_agent,
            created_at,
        }
    }

    /// Listing view: no client data, text cut to `preview_chars`
    pub fn to_entry(&self, preview_chars: usize) -> HistoryEntry {
        HistoryEntry {
            id: self.id,
            text_input: preview(&self.text_input, preview_chars),
            prediction: self.prediction,
            confidence: self.confidence,
            created_at: self.created_at,
        }
    }
}

/// One row of the public history listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub text_input: String,
    pub prediction: Label,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Hex SHA-256 of the textual address
pub fn hash_client_ip(ip: IpAddr) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First `max_chars` characters, with "..." appended when anything was cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

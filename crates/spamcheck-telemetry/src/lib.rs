//! spamcheck telemetry
//!
//! Classification history for the spamcheck service.
//!
//! Provides:
//! - An append-only record of classifications, optionally persisted as JSON lines
//! - An anonymized listing view for the history endpoint
//! - Client IP hashing so raw addresses are never stored

pub mod config;
pub mod record;
pub mod store;

pub use config::HistoryConfig;
pub use record::{hash_client_ip, ClassificationRecord, HistoryEntry, NewClassification};
pub use store::HistoryStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::HistoryConfig;
    pub use crate::record::{HistoryEntry, NewClassification};
    pub use crate::store::HistoryStore;
}

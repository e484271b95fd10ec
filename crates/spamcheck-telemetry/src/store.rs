//! Classification history store
//!
//! Records are kept in memory (newest last, bounded by `retention`) and,
//! when a path is configured, appended to a JSON-lines file. Opening an
//! existing file reloads its tail and continues the id sequence. A failed
//! file write stops persistence; the in-memory history keeps going.

use crate::config::HistoryConfig;
use crate::record::{ClassificationRecord, HistoryEntry, NewClassification};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use spamcheck_core::Result;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

struct FileSink {
    writer: Box<dyn Write + Send>,
    since_flush: usize,
}

impl FileSink {
    fn new(file: File) -> Self {
        Self {
            writer: Box::new(BufWriter::new(file)),
            since_flush: 0,
        }
    }

    fn append(&mut self, line: &[u8], flush_interval: usize) -> std::io::Result<()> {
        self.writer.write_all(line)?;
        self.since_flush += 1;
        if self.since_flush >= flush_interval {
            self.writer.flush()?;
            self.since_flush = 0;
        }
        Ok(())
    }
}

/// Thread-safe classification history
pub struct HistoryStore {
    config: HistoryConfig,
    records: RwLock<VecDeque<ClassificationRecord>>,
    next_id: Mutex<u64>,
    sink: Mutex<Option<FileSink>>,
}

impl HistoryStore {
    /// In-memory store; `config.path` is ignored
    pub fn in_memory(config: HistoryConfig) -> Self {
        Self {
            config,
            records: RwLock::new(VecDeque::new()),
            next_id: Mutex::new(1),
            sink: Mutex::new(None),
        }
    }

    /// Open the store described by `config`, reloading any persisted records
    pub fn open(config: HistoryConfig) -> Result<Self> {
        let Some(path) = config.path.clone() else {
            return Ok(Self::in_memory(config));
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let records = read_records(&path, config.retention)?;
        let next_id = records.back().map_or(1, |r| r.id + 1);
        info!(
            "Opened classification history at {} ({} records)",
            path.display(),
            records.len()
        );

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            config,
            records: RwLock::new(records),
            next_id: Mutex::new(next_id),
            sink: Mutex::new(Some(FileSink::new(file))),
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Store a classification, assigning its id and timestamp.
    ///
    /// The record is always kept in memory. An error means it could not be
    /// appended to the history file, which is then no longer written to.
    pub fn record(&self, new: NewClassification) -> Result<ClassificationRecord> {
        // Holding the id lock keeps file order equal to id order
        let mut next_id = self.next_id.lock();
        let record = ClassificationRecord::from_new(*next_id, new, Utc::now());
        *next_id += 1;

        {
            let mut records = self.records.write();
            records.push_back(record.clone());
            while records.len() > self.config.retention {
                records.pop_front();
            }
        }
        debug!("Recorded classification {} as {}", record.id, record.prediction);

        self.persist(&record)?;
        Ok(record)
    }

    fn persist(&self, record: &ClassificationRecord) -> Result<()> {
        let mut sink = self.sink.lock();
        let Some(active) = sink.as_mut() else {
            return Ok(());
        };

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        if let Err(e) = active.append(&line, self.config.flush_interval) {
            warn!("History file write failed, keeping history in memory only: {}", e);
            *sink = None;
            return Err(e.into());
        }
        Ok(())
    }

    /// Up to `limit` most recent non-empty records, newest first
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        self.records
            .read()
            .iter()
            .rev()
            .filter(|r| !r.text_input.is_empty())
            .take(limit)
            .map(|r| r.to_entry(self.config.preview_chars))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Force buffered records to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(sink) = self.sink.lock().as_mut() {
            sink.writer.flush()?;
            sink.since_flush = 0;
        }
        Ok(())
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.get_mut().as_mut() {
            let _ = sink.writer.flush();
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("path", &self.config.path)
            .field("records", &self.len())
            .finish()
    }
}

/// Last `retention` parseable records of a JSON-lines file
fn read_records(path: &Path, retention: usize) -> Result<VecDeque<ClassificationRecord>> {
    let mut records = VecDeque::new();
    if !path.exists() {
        return Ok(records);
    }

    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ClassificationRecord>(&line) {
            Ok(record) => {
                records.push_back(record);
                if records.len() > retention {
                    records.pop_front();
                }
            }
            Err(e) => {
                debug!("Skipping unreadable history line: {}", e);
            }
        }
    }

    Ok(records)
}

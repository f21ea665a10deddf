//! # Append-Only Event Log
//!
//! Durable history of every emitted event. Each record gets a monotonically
//! increasing sequence number, the emission time and a correlation id.
//!
//! Two implementations:
//! - [`AppendOnlyEventLog`]: in-memory, for tests and embedding
//! - [`JsonLinesEventLog`]: one JSON object per line in a file

use crate::events::ExchangeEvent;
use crate::publisher::EventSink;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_types::{SystemTimeSource, TimeSource, Timestamp};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// Emission time.
    pub recorded_at: Timestamp,
    /// Unique id of this record.
    pub correlation_id: Uuid,
    /// The event itself.
    pub event: ExchangeEvent,
}

/// Event log errors.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// Underlying file I/O failed.
    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded.
    #[error("corrupt event log line {line}: {source}")]
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// IN-MEMORY LOG
// =============================================================================

/// In-memory append-only log.
pub struct AppendOnlyEventLog {
    records: RwLock<Vec<EventRecord>>,
    clock: Arc<dyn TimeSource>,
}

impl AppendOnlyEventLog {
    /// Create an empty log stamped with system time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }

    /// Create an empty log with a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing was logged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of all records in order.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    /// Records with a sequence number strictly greater than `sequence`.
    #[must_use]
    pub fn since(&self, sequence: u64) -> Vec<EventRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.sequence > sequence)
            .cloned()
            .collect()
    }

    /// Events only, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.records.read().iter().map(|r| r.event.clone()).collect()
    }
}

impl Default for AppendOnlyEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for AppendOnlyEventLog {
    fn emit(&self, event: ExchangeEvent) {
        let mut records = self.records.write();
        let sequence = records.len() as u64 + 1;
        records.push(EventRecord {
            sequence,
            recorded_at: self.clock.now(),
            correlation_id: Uuid::new_v4(),
            event,
        });
    }
}

// =============================================================================
// JSON-LINES FILE LOG
// =============================================================================

struct FileState {
    file: File,
    next_sequence: u64,
}

/// File-backed log writing one JSON record per line.
///
/// Reopening an existing file continues its sequence numbering.
pub struct JsonLinesEventLog {
    path: PathBuf,
    state: Mutex<FileState>,
    clock: Arc<dyn TimeSource>,
}

impl JsonLinesEventLog {
    /// Open (or create) a log file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        Self::open_with_clock(path, Arc::new(SystemTimeSource))
    }

    /// Open (or create) a log file with a custom clock.
    pub fn open_with_clock(
        path: impl AsRef<Path>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, EventLogError> {
        let path = path.as_ref().to_path_buf();
        let existing = if path.exists() {
            Self::read_all(&path)?
        } else {
            Vec::new()
        };
        let next_sequence = existing.last().map_or(1, |r| r.sequence + 1);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            state: Mutex::new(FileState {
                file,
                next_sequence,
            }),
            clock,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record from a log file.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<EventRecord>, EventLogError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| EventLogError::Corrupt {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn append(&self, event: ExchangeEvent) -> Result<(), EventLogError> {
        let mut state = self.state.lock();
        let record = EventRecord {
            sequence: state.next_sequence,
            recorded_at: self.clock.now(),
            correlation_id: Uuid::new_v4(),
            event,
        };
        let mut line = serde_json::to_vec(&record).map_err(std::io::Error::from)?;
        line.push(b'\n');
        state.file.write_all(&line)?;
        state.file.flush()?;
        state.next_sequence += 1;
        Ok(())
    }
}

impl EventSink for JsonLinesEventLog {
    fn emit(&self, event: ExchangeEvent) {
        let name = event.name();
        if let Err(e) = self.append(event) {
            warn!(event = name, path = %self.path.display(), error = %e, "Failed to append event");
        }
    }
}

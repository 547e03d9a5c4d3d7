//! The call log
//!
//! Every call appends an entry line before it touches the filesystem and
//! exactly one outcome line before it returns.

use auditfs_ops::{Errno, OpKind};

use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;

/// The outcome of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(Errno),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Success => f.write_str("operation succeeded"),
            Self::Failure(errno) => {
                write!(f, "operation failed: {}", io::Error::from(errno))
            }
        }
    }
}

/// An append-only sink of call records, shared by concurrent calls
pub trait CallLog: Send + Sync {
    /// Appends the entry line of a call
    fn entry(&self, kind: OpKind, op: &dyn Display);

    /// Appends the outcome line of a call
    fn outcome(&self, kind: OpKind, outcome: Outcome);
}

/// A call log backed by a file
#[derive(Debug)]
pub struct FileLog {
    /// every line is flushed as soon as it is complete
    file: Mutex<LineWriter<File>>,
}

impl FileLog {
    /// Opens `path` for appending, creating it if it does not exist
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }

    #[must_use]
    pub fn new(file: File) -> Self {
        Self {
            file: Mutex::new(LineWriter::new(file)),
        }
    }

    /// Writes a whole line while holding the lock
    fn append(&self, line: fmt::Arguments<'_>) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let ret = file.write_fmt(line).and_then(|()| file.flush());
        if let Err(err) = ret {
            warn!(%err, "failed to append to the call log");
        }
    }
}

impl CallLog for FileLog {
    fn entry(&self, _: OpKind, op: &dyn Display) {
        self.append(format_args!("{}\n", op));
    }

    fn outcome(&self, _: OpKind, outcome: Outcome) {
        self.append(format_args!("{}\n", outcome));
    }
}

/// One record kept by [`MemoryLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Entry(OpKind, String),
    Outcome(OpKind, Outcome),
}

/// A call log kept in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<Record>>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records appended so far
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, record: Record) {
        match self.records.lock() {
            Ok(mut guard) => guard.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

impl CallLog for MemoryLog {
    fn entry(&self, kind: OpKind, op: &dyn Display) {
        self.push(Record::Entry(kind, op.to_string()));
    }

    fn outcome(&self, kind: OpKind, outcome: Outcome) {
        self.push(Record::Outcome(kind, outcome));
    }
}

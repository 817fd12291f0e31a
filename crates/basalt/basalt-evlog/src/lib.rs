//! Timestamped event log for replaying queue activity after a run.
//!
//! Records go into their own [`OverwriteRing`] behind a plain mutex, never the
//! queue's lock discipline, so logging never shows up in the queue's
//! contention numbers. When the log is full the oldest records are dropped.
//!
//! Nothing is printed while recording. [`EventLog::drain_and_render`] empties
//! the log oldest-first into a writer once the run is over.

use basalt_events::{EventKind, EventRecord};
use basalt_ring::{OverwriteRing, RingConfig, RingError};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Large enough to hold every event of a default run.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("failed to open event log file '{path}'")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write event log")]
    Write(#[from] io::Error),
}

pub struct EventLog {
    ring: Mutex<OverwriteRing<EventRecord>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        let ring = OverwriteRing::new(RingConfig::for_payload::<EventRecord>(capacity))?;
        Ok(Self {
            ring: Mutex::new(ring),
        })
    }

    /// Appends one record stamped with the current monotonic time.
    pub fn record(&self, kind: EventKind, value: u32) {
        // Read the clock before locking so its cost is not charged to the lock.
        let at = basalt_clock::now();
        self.ring().enqueue(&EventRecord::new(kind, value, at));
    }

    /// Removes the oldest record.
    pub fn pop(&self) -> Option<EventRecord> {
        self.ring().dequeue()
    }

    pub fn len(&self) -> usize {
        self.ring().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records lost to overwrite since creation.
    pub fn dropped(&self) -> u64 {
        self.ring().evicted()
    }

    /// Pops every record oldest-first and writes one line per record:
    ///
    /// ```text
    /// 0: enq val=1 time=5.000012345
    /// 1: deq val=1 time=5.000013002
    /// total log records = 2
    /// ```
    ///
    /// Returns the number of records written.
    pub fn drain_and_render<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        let mut n = 0usize;
        while let Some(rec) = self.pop() {
            writeln!(out, "{n}: {rec}")?;
            n += 1;
        }
        writeln!(out, "total log records = {n}")?;
        Ok(n)
    }

    /// Drains into `path`, opened in append mode, behind a dated header line.
    ///
    /// If the file cannot be opened nothing is drained and the error is
    /// returned to the caller.
    pub fn drain_to_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, EventLogError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| {
                tracing::error!(path = %path.display(), error = %source, "cannot open event log file");
                EventLogError::Open {
                    path: path.display().to_string(),
                    source,
                }
            })?;

        let mut out = BufWriter::new(file);
        writeln!(
            out,
            "# basalt {} event log, run at {}",
            env!("CARGO_PKG_VERSION"),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        let n = self.drain_and_render(&mut out)?;
        out.flush()?;
        tracing::debug!(path = %path.display(), records = n, "event log written");
        Ok(n)
    }

    fn ring(&self) -> MutexGuard<'_, OverwriteRing<EventRecord>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

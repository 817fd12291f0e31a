use basalt_clock::Timestamp;
use std::fmt;

use crate::payload::END_OF_STREAM;

/// What happened. Discriminants match the numbering used in rendered dumps.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Enqueued = 1,
    Dequeued = 2,
    /// Consumer polled an empty queue this many times before data arrived.
    ConsumerIdle = 3,
    NewHighWaterMark = 4,
    Ended = 5,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Enqueued => "enq",
            EventKind::Dequeued => "deq",
            EventKind::ConsumerIdle => "deq rb empty",
            EventKind::NewHighWaterMark => "max queue",
            EventKind::Ended => "end",
        }
    }
}

/// One timestamped entry of the event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub kind: EventKind,
    pub value: u32,
    pub at: Timestamp,
}

impl EventRecord {
    pub fn new(kind: EventKind, value: u32, at: Timestamp) -> Self {
        Self { kind, value, at }
    }
}

/// `<label> <value> time=<secs>.<nanos>`; the sentinel value prints as `END_EL`.
impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if self.value == END_OF_STREAM {
            f.write_str(" END_EL")?;
        } else {
            write!(f, " val={}", self.value)?;
        }
        write!(f, " time={}", self.at)
    }
}

//! Monotonic timestamps for event records and run timing.
//!
//! Timestamps come straight from `clock_gettime(CLOCK_MONOTONIC)` (or the mach
//! timebase on macOS) and keep whole seconds and nanoseconds apart so they can
//! be rendered as `<seconds>.<nanoseconds>` without float rounding.

use std::fmt;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point on the monotonic clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { secs: 0, nanos: 0 };

    #[inline]
    pub fn from_nanos(ns: u64) -> Self {
        Self {
            secs: ns / NANOS_PER_SEC,
            nanos: (ns % NANOS_PER_SEC) as u32,
        }
    }

    #[inline]
    pub fn as_nanos(&self) -> u64 {
        self.secs * NANOS_PER_SEC + self.nanos as u64
    }

    /// Time elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(&self, earlier: Timestamp) -> Timestamp {
        Timestamp::from_nanos(self.as_nanos().saturating_sub(earlier.as_nanos()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

#[cfg(target_os = "macos")]
#[inline(always)]
#[allow(deprecated)]
pub fn now() -> Timestamp {
    use std::sync::OnceLock;
    static TIMEBASE: OnceLock<(u64, u64)> = OnceLock::new();
    let (numer, denom) = *TIMEBASE.get_or_init(|| {
        let mut info = libc::mach_timebase_info_data_t { numer: 0, denom: 0 };
        let rc = unsafe { libc::mach_timebase_info(&mut info) };
        if rc != 0 || info.denom == 0 {
            (1, 1)
        } else {
            (info.numer as u64, info.denom as u64)
        }
    });
    let t = unsafe { libc::mach_absolute_time() } as u128;
    Timestamp::from_nanos(((t * numer as u128) / denom as u128) as u64)
}

#[cfg(not(target_os = "macos"))]
#[inline(always)]
pub fn now() -> Timestamp {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    Timestamp {
        secs: ts.tv_sec as u64,
        nanos: ts.tv_nsec as u32,
    }
}

/// Measures one interval, started at construction and closed by `stop`.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    start: Timestamp,
    end: Option<Timestamp>,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: now(),
            end: None,
        }
    }

    pub fn stop(&mut self) -> Timestamp {
        let end = now();
        self.end = Some(end);
        end.since(self.start)
    }

    /// Elapsed time; a running stopwatch measures up to now.
    pub fn elapsed(&self) -> Timestamp {
        self.end.unwrap_or_else(now).since(self.start)
    }

    /// `delta=<s>.<ns>` form used in run summaries.
    pub fn delta(&self) -> String {
        format!("delta={}", self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }

    #[test]
    fn display_pads_nanoseconds() {
        let ts = Timestamp { secs: 12, nanos: 345 };
        assert_eq!(ts.to_string(), "12.000000345");
    }

    #[test]
    fn since_borrows_across_the_second() {
        let a = Timestamp { secs: 3, nanos: 900_000_000 };
        let b = Timestamp { secs: 5, nanos: 100_000_000 };
        assert_eq!(b.since(a), Timestamp { secs: 1, nanos: 200_000_000 });
        assert_eq!(a.since(b), Timestamp::ZERO);
    }

    #[test]
    fn stopped_watch_is_frozen() {
        let mut sw = Stopwatch::start();
        let took = sw.stop();
        assert_eq!(sw.elapsed(), took);
        assert!(sw.delta().starts_with("delta=0."));
    }
}

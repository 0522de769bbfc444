//! Storage path derivation
//!
//! Content without an explicit path is filed under a date prefix:
//!
//! ```text
//! 1984/05/04/14_28_01_0_hello.png
//! ^^^^^^^^^^ ^^^^^^^^ ^ ^^^^^^^^^
//! date       time     | sanitized name (or "file")
//!                     per-second write counter
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Captures, Regex};

/// File name used when content carries no usable name
pub const DEFAULT_FILENAME: &str = "file";

static UNSAFE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]+").expect("unsafe character pattern is valid"));

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Counter distinguishing writes that land in the same wall-clock second.
///
/// Starts at 0 for every new second and increments for each further write
/// within that second.
#[derive(Debug, Default)]
pub struct WriteSequence {
    second: Option<NaiveDateTime>,
    counter: u64,
}

impl WriteSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter value for a write happening at `now`
    pub fn next(&mut self, now: NaiveDateTime) -> u64 {
        let second = now.with_nanosecond(0).unwrap_or(now);
        if self.second == Some(second) {
            self.counter += 1;
        } else {
            self.second = Some(second);
            self.counter = 0;
        }
        self.counter
    }
}

/// Replace runs of unsafe characters with a single `_`.
///
/// Runs touching either end of the segment are dropped rather than replaced.
pub fn sanitize_segment(segment: &str) -> String {
    let len = segment.len();
    UNSAFE_RUN
        .replace_all(segment, |caps: &Captures| match caps.get(0) {
            Some(m) if m.start() > 0 && m.end() < len => "_",
            _ => "",
        })
        .into_owned()
}

/// Sanitize every `/`-separated segment of a relative path.
///
/// Empty, `.` and `..` segments are dropped, so the result is always relative.
pub fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(sanitize_segment)
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Proposes relative storage paths for new content
pub struct PathDeriver {
    clock: Arc<dyn Clock>,
    sequence: Mutex<WriteSequence>,
}

impl PathDeriver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sequence: Mutex::new(WriteSequence::new()),
        }
    }

    /// Candidate path for content named `name`, or at `explicit` when given
    pub fn derive(&self, name: Option<&str>, explicit: Option<&str>) -> String {
        if let Some(path) = explicit.map(sanitize_path).filter(|p| !p.is_empty()) {
            return path;
        }

        let now = self.clock.now();
        let counter = self.sequence.lock().next(now);
        let filename = name
            .map(sanitize_segment)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        format!("{}_{}_{}", now.format("%Y/%m/%d/%H_%M_%S"), counter, filename)
    }
}

impl Default for PathDeriver {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for PathDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathDeriver")
            .field("sequence", &*self.sequence.lock())
            .finish_non_exhaustive()
    }
}

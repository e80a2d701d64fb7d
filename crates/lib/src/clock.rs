//! Time provider abstraction
//!
//! Every change carries a wall-clock timestamp. Documents never read the
//! system time directly; they ask the [`Clock`] configured in their
//! [`DocOptions`](crate::DocOptions). Production code uses [`SystemClock`],
//! seed documents use [`EpochClock`] so their changes hash identically
//! everywhere, and tests use the controllable `FixedClock`.
//!
//! # Example
//!
//! ```
//! use amalgam::{Clock, EpochClock, SystemClock};
//!
//! let clock = SystemClock;
//! assert!(clock.now_millis() > 0);
//!
//! assert_eq!(EpochClock.now_millis(), 0);
//! assert_eq!(EpochClock.now_rfc3339(), "1970-01-01T00:00:00+00:00");
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

use chrono::{TimeZone, Utc};

/// A time provider for change timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Returns the current time as an RFC3339-formatted string.
    fn now_rfc3339(&self) -> String {
        format_millis(self.now_millis())
    }
}

/// Render milliseconds since the Unix epoch as RFC3339.
///
/// Out-of-range values render as the epoch rather than failing.
pub fn format_millis(millis: u64) -> String {
    let secs = (millis / 1000) as i64;
    let nanos = ((millis % 1000) * 1_000_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339()
    }
}

/// A clock stopped at the Unix epoch.
///
/// Used for seed documents: a change made by the seed actor at time 0
/// has the same hash on every machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochClock;

impl Clock for EpochClock {
    fn now_millis(&self) -> u64 {
        0
    }
}

/// Test clock with auto-advancing time.
///
/// This clock auto-advances on each `now_millis()` call, providing monotonically
/// increasing timestamps. Use `hold()` to temporarily freeze the clock for tests
/// needing stable timestamps.
///
/// # Example
///
/// ```
/// use amalgam::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// let t1 = clock.now_millis();  // Returns 1000, then advances
/// let t2 = clock.now_millis();  // Returns next value
/// assert!(t2 > t1);
///
/// {
///     let _hold = clock.hold();
///     let a = clock.now_millis();
///     let b = clock.now_millis();
///     assert_eq!(a, b);  // Frozen
/// }
/// ```
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

#[cfg(any(test, feature = "testing"))]
struct FixedClockState {
    millis: u64,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
#[cfg(any(test, feature = "testing"))]
pub struct ClockHold<'a>(&'a FixedClock);

#[cfg(any(test, feature = "testing"))]
impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.state.lock().unwrap().held = false;
    }
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a new fixed clock with the given initial time in milliseconds.
    pub fn new(millis: u64) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    /// Hold the clock, preventing auto-advance until the guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.state.lock().unwrap().held = true;
        ClockHold(self)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.state.lock().unwrap().millis += ms;
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.state.lock().unwrap().millis = ms;
    }

    /// Get the current time without advancing (even if not held).
    pub fn get(&self) -> u64 {
        self.state.lock().unwrap().millis
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        if state.held {
            state.millis
        } else {
            let t = state.millis;
            state.millis += 1;
            t
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1704067200000)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}

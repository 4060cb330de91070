//! Bounded polling for UI-state convergence.
//!
//! Every state-changing browser action (click, submit, navigation) follows
//! the same shape: snapshot an observable, act, then poll until the
//! observable differs from the snapshot or a known terminal state (such as
//! an error banner) shows up. These helpers only detect *some* change; the
//! caller asserts the resulting value afterwards.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::time::Duration;
//! use wp_test_report::wait::wait_until_changed;
//!
//! let count = Cell::new(0);
//! let before = count.get();
//! count.set(1); // the "action"
//! assert!(wait_until_changed(&before, || count.get(), Duration::from_millis(200), Duration::from_millis(10)));
//! ```

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{self, WaitSettings};

/// How a bounded wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The observable differs from the "before" snapshot; carries the new value
    Changed(T),
    /// The alternative terminal condition appeared first
    Terminal,
    /// Neither happened before the deadline
    TimedOut,
}

impl<T> WaitOutcome<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, WaitOutcome::Changed(_))
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

/// Timeout and poll interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Same interval, different timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<WaitSettings> for PollConfig {
    fn from(settings: WaitSettings) -> Self {
        Self::new(settings.timeout, settings.interval)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        config::wait_settings().into()
    }
}

/// Poll `probe` until its value differs from `before`.
///
/// The probe runs at least once, even with a zero timeout. Returns `false`
/// on timeout.
pub fn wait_until_changed<T, F>(before: &T, probe: F, timeout: Duration, interval: Duration) -> bool
where
    T: PartialEq,
    F: FnMut() -> T,
{
    wait_until_changed_or(before, probe, || false, timeout, interval).is_changed()
}

/// Poll until `probe` differs from `before` or `terminal` reports true.
///
/// The change check wins when both hold on the same tick.
pub fn wait_until_changed_or<T, F, G>(
    before: &T,
    mut probe: F,
    mut terminal: G,
    timeout: Duration,
    interval: Duration,
) -> WaitOutcome<T>
where
    T: PartialEq,
    F: FnMut() -> T,
    G: FnMut() -> bool,
{
    let start = Instant::now();
    let mut polls = 0usize;

    loop {
        polls += 1;

        let current = probe();
        if current != *before {
            return WaitOutcome::Changed(current);
        }
        if terminal() {
            debug!("wait ended on terminal condition after {} polls", polls);
            return WaitOutcome::Terminal;
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            debug!("wait timed out after {:?} ({} polls)", elapsed, polls);
            return WaitOutcome::TimedOut;
        }
        thread::sleep(interval.min(timeout - elapsed));
    }
}

/// Poll `condition` until it holds. Returns `false` on timeout.
pub fn wait_for<F>(mut condition: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    wait_until_changed(&false, &mut condition, timeout, interval)
}

/// Snapshot `probe`, run `action`, then wait for the observable to change.
///
/// Returns the new value, or the terminal/timeout outcome.
pub fn act_and_wait<T, A, F, G>(
    action: A,
    mut probe: F,
    terminal: G,
    poll: PollConfig,
) -> WaitOutcome<T>
where
    T: PartialEq,
    A: FnOnce(),
    F: FnMut() -> T,
    G: FnMut() -> bool,
{
    let before = probe();
    action();
    wait_until_changed_or(&before, probe, terminal, poll.timeout, poll.interval)
}

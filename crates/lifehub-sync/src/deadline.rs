//! # Deadline Combinator
//!
//! The one place "race work against a timer" is implemented.
//!
//! ## Guarantees
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       race_deadline(limit, work)                        │
//! │                                                                         │
//! │   timer armed  ──────────────────────────────► fires at `limit`        │
//! │   work polled  ──────► completes? ─► Completed(output)                 │
//! │                        hangs?     ─► DeadlineElapsed (work dropped)    │
//! │                                                                         │
//! │  • the timer is armed BEFORE the work future is first polled, so a     │
//! │    network stack that never responds cannot delay the deadline         │
//! │  • the call always resolves: there is no path that waits forever       │
//! │  • on elapse the work future is dropped, cancelling any in-flight      │
//! │    request it owns                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

/// Outcome of racing a future against a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome<T> {
    /// The work finished inside the budget.
    Completed(T),

    /// The deadline fired first; the work was dropped.
    DeadlineElapsed,
}

impl<T> DeadlineOutcome<T> {
    /// The completed value, or a fallback computed on elapse.
    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            DeadlineOutcome::Completed(value) => value,
            DeadlineOutcome::DeadlineElapsed => fallback(),
        }
    }

    /// Whether the deadline fired.
    pub fn elapsed(&self) -> bool {
        matches!(self, DeadlineOutcome::DeadlineElapsed)
    }
}

/// Races `work` against a wall-clock deadline.
pub async fn race_deadline<F>(limit: Duration, work: F) -> DeadlineOutcome<F::Output>
where
    F: Future,
{
    let timer = tokio::time::sleep(limit);
    tokio::pin!(timer);
    tokio::pin!(work);

    tokio::select! {
        output = &mut work => DeadlineOutcome::Completed(output),
        _ = &mut timer => DeadlineOutcome::DeadlineElapsed,
    }
}

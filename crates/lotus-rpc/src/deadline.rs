//! Explicit deadlines for network operations.
//!
//! Every outbound operation takes a `Deadline` value instead of reading
//! ambient timeout state, so one deadline set at process start bounds the
//! whole invocation.

use std::time::Duration;

use tokio::time::Instant;

/// A fixed point in time by which an operation must complete.
///
/// Copyable and cheap to pass by value. Operations bound themselves with
/// [`tokio::time::timeout_at`] against [`Deadline::instant`].
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now() + duration)
    }

    /// The underlying instant, for use with `timeout_at`.
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before the deadline, zero if it has already passed.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

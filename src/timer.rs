//! Cooperative cancellation.
//!
//! The core never spawns a thread to enforce a timeout; every long-running loop polls a
//! [`Deadline`] at natural checkpoints (top of each WalkSAT flip, top of each MC-SAT sample,
//! after each clause template is ground, after each unit-propagation fixed-point iteration)
//! and returns [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout) rather than tearing
//! down whatever state it holds.

use std::time::{Duration, Instant};

/// A monotonic point in time past which a phase should stop and report partial results.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// No deadline: [`has_expired`](Deadline::has_expired) never returns `true`.
    pub fn none() -> Self {
        Deadline { expires_at: None }
    }

    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Deadline {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    /// Whether the deadline has passed.
    pub fn has_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if Instant::now() >= at)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_deadline_never_expires() {
        assert!(!Deadline::none().has_expired());
    }

    #[test]
    fn past_deadline_expires_immediately() {
        let d = Deadline::after(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(1));
        assert!(d.has_expired());
    }

    #[test]
    fn future_deadline_has_not_expired() {
        let d = Deadline::after(Duration::from_secs(60));
        assert!(!d.has_expired());
    }
}

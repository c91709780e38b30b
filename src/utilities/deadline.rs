/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::time::{Instant, Duration};

/// The point in time at which a pending wait gives up, if any.
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A timeout too large to be represented is treated as "no timeout".
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|duration| Instant::now().checked_add(duration)),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Whether a poll that was given `remaining` as its timeout was the last one.
pub fn exhausted(remaining: Option<Duration>) -> bool {
    remaining.map(|time| time.is_zero()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_exhausts() {
        let deadline = Deadline::after(None);
        assert_eq!(deadline.remaining(), None);
        assert!(!exhausted(deadline.remaining()));
    }

    #[test]
    fn zero_timeout_is_exhausted() {
        let deadline = Deadline::after(Some(Duration::ZERO));
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
        assert!(exhausted(deadline.remaining()));
    }

    #[test]
    fn huge_timeout_means_unlimited() {
        assert_eq!(Deadline::after(Some(Duration::MAX)).remaining(), None);
        let deadline = Deadline::after(Some(Duration::from_secs(3600)));
        assert!(deadline.remaining().unwrap() <= Duration::from_secs(3600));
    }
}

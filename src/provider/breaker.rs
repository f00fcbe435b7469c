//! Session circuit breaker for remote AI calls
//!
//! Once the remote service shows a quota/rate-limit or timeout class of
//! failure it is considered bad for the rest of the process: every later
//! call skips the network and goes straight to local generation. The flag
//! is set once and never cleared; only a fresh process start re-enables
//! remote calls. The breaker lives inside the provider and is shared by
//! the architect and news paths, never exposed as ambient global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// One-off failure; the next call may try the network again
    Transient,
    /// Quota, rate-limit, or timeout: the remote is known-bad for the
    /// remainder of this session
    SessionFatal,
}

pub struct CircuitBreaker {
    open: AtomicBool,
    network_attempts: AtomicU64,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
            network_attempts: AtomicU64::new(0),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    /// Record a failure; session-fatal classes open the breaker.
    pub fn record_failure(&self, class: FailureClass) {
        if class == FailureClass::SessionFatal {
            self.trip();
        }
    }

    /// Open the breaker permanently for this session.
    pub fn trip(&self) {
        if !self.open.swap(true, Ordering::Relaxed) {
            tracing::warn!("circuit breaker opened; remote AI disabled for the rest of this session");
        }
    }

    /// Count an outgoing network call. Used to verify that an open breaker
    /// really silences all remote traffic.
    pub fn note_attempt(&self) {
        self.network_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn network_attempts(&self) -> u64 {
        self.network_attempts.load(Ordering::Relaxed)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed() {
        let breaker = CircuitBreaker::new();
        assert!(!breaker.is_open());
        assert_eq!(breaker.network_attempts(), 0);
    }

    #[test]
    fn test_transient_failures_do_not_trip() {
        let breaker = CircuitBreaker::new();
        for _ in 0..10 {
            breaker.record_failure(FailureClass::Transient);
        }
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_session_fatal_trips_permanently() {
        let breaker = CircuitBreaker::new();
        breaker.record_failure(FailureClass::SessionFatal);
        assert!(breaker.is_open());
        // No re-enable path exists; further failures keep it open.
        breaker.record_failure(FailureClass::Transient);
        assert!(breaker.is_open());
    }

    #[test]
    fn test_attempt_counter() {
        let breaker = CircuitBreaker::new();
        breaker.note_attempt();
        breaker.note_attempt();
        assert_eq!(breaker.network_attempts(), 2);
    }
}

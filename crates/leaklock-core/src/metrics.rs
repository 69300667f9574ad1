//! Global atomic counters for dispatch activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the CLI exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    dispatches: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
    registry_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            dispatches: AtomicU64::new(0),
            deliveries_succeeded: AtomicU64::new(0),
            deliveries_failed: AtomicU64::new(0),
            registry_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "dispatches", "counter incremented");
    }

    /// Count one finished delivery attempt.
    pub fn record_delivery(&self, success: bool) {
        if success {
            self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(metric = "deliveries_succeeded", "counter incremented");
        } else {
            self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(metric = "deliveries_failed", "counter incremented");
        }
    }

    pub fn inc_registry_failures(&self) {
        self.registry_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "registry_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            dispatches = self.dispatches(),
            deliveries_succeeded = self.deliveries_succeeded(),
            deliveries_failed = self.deliveries_failed(),
            registry_failures = self.registry_failures(),
        );
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn deliveries_succeeded(&self) -> u64 {
        self.deliveries_succeeded.load(Ordering::Relaxed)
    }

    pub fn deliveries_failed(&self) -> u64 {
        self.deliveries_failed.load(Ordering::Relaxed)
    }

    pub fn registry_failures(&self) -> u64 {
        self.registry_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.dispatches.store(0, Ordering::Relaxed);
        self.deliveries_succeeded.store(0, Ordering::Relaxed);
        self.deliveries_failed.store(0, Ordering::Relaxed);
        self.registry_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_dispatches();
        m.record_delivery(true);
        m.record_delivery(true);
        m.record_delivery(false);
        m.inc_registry_failures();

        assert_eq!(m.dispatches(), 1);
        assert_eq!(m.deliveries_succeeded(), 2);
        assert_eq!(m.deliveries_failed(), 1);
        assert_eq!(m.registry_failures(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_dispatches();
        m.record_delivery(false);
        m.inc_registry_failures();
        m.reset();
        assert_eq!(m.dispatches(), 0);
        assert_eq!(m.deliveries_failed(), 0);
        assert_eq!(m.registry_failures(), 0);
    }
}

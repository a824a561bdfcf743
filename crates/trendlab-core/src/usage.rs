//! Per-source usage accounting.
//!
//! One counter instance per signal source, created by the caller and handed
//! to the source implementation. Never a process-global: tests can reset a
//! counter deterministically without touching any other source's numbers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Request/signal/failure counters for one named source.
#[derive(Debug)]
pub struct SourceUsage {
    source: String,
    requests: AtomicU64,
    signals: AtomicU64,
    failures: AtomicU64,
}

impl SourceUsage {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            requests: AtomicU64::new(0),
            signals: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_signals(&self, count: u64) {
        self.signals.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            source: self.source.clone(),
            requests: self.requests.load(Ordering::SeqCst),
            signals: self.signals.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
        }
    }

    pub fn reset(&self) {
        self.requests.store(0, Ordering::SeqCst);
        self.signals.store(0, Ordering::SeqCst);
        self.failures.store(0, Ordering::SeqCst);
    }
}

/// Point-in-time copy of a [`SourceUsage`] counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub source: String,
    pub requests: u64,
    pub signals: u64,
    pub failures: u64,
}

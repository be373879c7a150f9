use std::sync::atomic::{AtomicUsize, Ordering};

/// Call counters shared by the mock providers.
#[derive(Debug, Default)]
pub struct ProviderCounts {
    probes: AtomicUsize,
    generates: AtomicUsize,
}

impl ProviderCounts {
    /// Number of health probes received.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of generate calls received.
    pub fn generates(&self) -> usize {
        self.generates.load(Ordering::SeqCst)
    }

    pub(crate) fn probe(&self) {
        self.probes.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn generate(&self) {
        self.generates.fetch_add(1, Ordering::SeqCst);
    }
}

//! Shared provider health cache.
//!
//! Probe results are trusted for a short TTL so a busy chain does not probe
//! on every call. Any caller may read or write an entry; the last write wins.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default time a probe result stays fresh.
pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(45);

/// Most recent knowledge about one provider.
#[derive(Debug, Clone)]
pub struct HealthEntry {
    /// Result of the last probe or call.
    pub available: bool,
    /// Latency of the last successful probe or call.
    pub latency: Option<Duration>,
    /// When this entry was written.
    pub checked_at: Instant,
    /// Error text of the last failure.
    pub last_error: Option<String>,
}

impl HealthEntry {
    /// Whether the entry is still inside the TTL window.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.checked_at.elapsed() < ttl
    }
}

/// TTL cache of provider availability.
#[derive(Debug)]
pub struct HealthCache {
    entries: RwLock<HashMap<String, HealthEntry>>,
    ttl: Duration,
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_TTL)
    }
}

impl HealthCache {
    /// Create a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entry for a provider if it is still fresh.
    pub async fn fresh(&self, provider_id: &str) -> Option<HealthEntry> {
        self.entries
            .read()
            .await
            .get(provider_id)
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    /// Entry for a provider regardless of age.
    pub async fn get(&self, provider_id: &str) -> Option<HealthEntry> {
        self.entries.read().await.get(provider_id).cloned()
    }

    /// Record a successful probe or call.
    pub async fn record_success(&self, provider_id: &str, latency: Duration) {
        self.entries.write().await.insert(
            provider_id.to_string(),
            HealthEntry {
                available: true,
                latency: Some(latency),
                checked_at: Instant::now(),
                last_error: None,
            },
        );
    }

    /// Record a failed probe or a connectivity failure during a call.
    ///
    /// The last known latency is kept for reporting.
    pub async fn record_failure(&self, provider_id: &str, error: impl Into<String>) {
        let mut entries = self.entries.write().await;
        let latency = entries.get(provider_id).and_then(|e| e.latency);
        entries.insert(
            provider_id.to_string(),
            HealthEntry {
                available: false,
                latency,
                checked_at: Instant::now(),
                last_error: Some(error.into()),
            },
        );
    }

    /// Forget a provider so the next check probes it.
    pub async fn invalidate(&self, provider_id: &str) {
        self.entries.write().await.remove(provider_id);
    }

    /// Forget everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = HealthCache::new(Duration::from_secs(30));
        cache.record_failure("ollama", "connection refused").await;

        let entry = cache.fresh("ollama").await.unwrap();
        assert!(!entry.available);
        assert_eq!(entry.last_error.as_deref(), Some("connection refused"));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.fresh("ollama").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.fresh("ollama").await.is_none());
        assert!(cache.get("ollama").await.is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_latency() {
        let cache = HealthCache::default();
        cache
            .record_success("openai", Duration::from_millis(120))
            .await;
        cache.record_failure("openai", "timeout").await;

        let entry = cache.get("openai").await.unwrap();
        assert!(!entry.available);
        assert_eq!(entry.latency, Some(Duration::from_millis(120)));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = HealthCache::default();
        cache.record_success("ollama", Duration::from_millis(5)).await;
        cache.invalidate("ollama").await;
        assert!(cache.get("ollama").await.is_none());
    }
}

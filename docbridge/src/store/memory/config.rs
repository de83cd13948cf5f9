use crate::common::DEFAULT_MAX_BATCH_SIZE;
use std::time::Duration;

/// Configuration for an in-memory store.
///
/// ```text
/// let config = MemoryStoreConfig::new();
/// let store = MemoryStore::new(config);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    max_batch_size: usize,
    read_only: bool,
    latency: Option<Duration>,
}

impl MemoryStoreConfig {
    pub fn new() -> MemoryStoreConfig {
        MemoryStoreConfig {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            read_only: false,
            latency: None,
        }
    }

    /// Largest batch accepted by a single bulk write.
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// A read-only store rejects every write with `WriteRejected`, the way a
    /// backend does when its security rules deny the caller.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Artificial delay added before every round-trip.
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    pub(crate) fn set_max_batch_size(&mut self, max_batch_size: usize) {
        self.max_batch_size = max_batch_size;
    }

    pub(crate) fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub(crate) fn set_latency(&mut self, latency: Option<Duration>) {
        self.latency = latency;
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_config_defaults() {
        let config = MemoryStoreConfig::new();
        assert_eq!(config.max_batch_size(), 500);
        assert!(!config.is_read_only());
        assert!(config.latency().is_none());
    }

    #[test]
    fn test_memory_store_config_setters() {
        let mut config = MemoryStoreConfig::default();
        config.set_max_batch_size(3);
        config.set_read_only(true);
        config.set_latency(Some(Duration::from_millis(5)));

        assert_eq!(config.max_batch_size(), 3);
        assert!(config.is_read_only());
        assert_eq!(config.latency(), Some(Duration::from_millis(5)));
    }
}

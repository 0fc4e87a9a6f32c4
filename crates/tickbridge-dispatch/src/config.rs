//! Dispatcher Configuration

use std::time::Duration;

/// Dispatcher configuration options
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How long the worker thread waits when its queue is empty before
    /// re-checking. A push wakes the worker early, so this only bounds the
    /// latency of the shutdown check on an idle worker.
    pub idle_poll_interval: Duration,

    /// Maximum number of invocations per work item. An item still reporting
    /// incomplete after this many attempts is abandoned and logged.
    /// `None` retries indefinitely.
    pub max_attempts: Option<u32>,

    /// OS thread name for the background worker.
    pub worker_thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: Duration::from_millis(5),
            max_attempts: None,
            worker_thread_name: "tickbridge-worker".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();

        assert_eq!(config.idle_poll_interval, Duration::from_millis(5));
        assert!(config.max_attempts.is_none());
        assert_eq!(config.worker_thread_name, "tickbridge-worker");
    }
}

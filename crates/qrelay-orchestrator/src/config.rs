//! Orchestrator-level configuration knobs (spec §4.5/§6), read once at
//! startup through typed fields with defaults — one `std::env::var` call
//! per field, never scattered through business logic, in the style of
//! `arvak_sched::SchedulerConfig`/`arvak_grpc::config::Config::from_env`.

use std::time::Duration;

/// Runtime configuration for an [`crate::Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// `EXECUTE_ASYNCHRONOUSLY` — when `false`, jobs run inline on the
    /// caller's task instead of being queued to the worker pool.
    pub execute_asynchronously: bool,

    /// `ENABLE_EXPERIMENTAL_FEATURES` — gates pilot capabilities not yet
    /// considered stable (e.g. SAMPLER/ESTIMATOR on adapters that only
    /// soft-support them).
    pub enable_experimental_features: bool,

    /// Number of worker tasks pulling from the job queue. Clamped to at
    /// least 1.
    pub worker_pool_size: usize,

    /// Bound on the number of jobs that may sit in the queue awaiting a
    /// free worker before `enqueue` returns `QueueFull`.
    pub queue_capacity: usize,

    /// Per-attempt backoff base for transient provider failures
    /// (`PilotError::is_transient`); attempt `n` waits `base * 2^n`.
    pub retry_backoff_base: Duration,

    /// Maximum number of provider-call attempts before giving up and
    /// recording an ERROR result.
    pub max_retry_attempts: u32,
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            execute_asynchronously: true,
            enable_experimental_features: false,
            worker_pool_size: 4,
            queue_capacity: 256,
            retry_backoff_base: Duration::from_secs(1),
            max_retry_attempts: 3,
        }
    }
}

impl OrchestratorConfig {
    /// Builds a config from defaults overridden by whichever of
    /// `EXECUTE_ASYNCHRONOUSLY`, `ENABLE_EXPERIMENTAL_FEATURES`,
    /// `QRELAY_WORKER_POOL_SIZE`, `QRELAY_QUEUE_CAPACITY`,
    /// `QRELAY_RETRY_BACKOFF_SECONDS`, `QRELAY_MAX_RETRY_ATTEMPTS` are set.
    /// Values that fail to parse fall back to the default rather than
    /// panicking.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            execute_asynchronously: env_bool("EXECUTE_ASYNCHRONOUSLY", defaults.execute_asynchronously),
            enable_experimental_features: env_bool(
                "ENABLE_EXPERIMENTAL_FEATURES",
                defaults.enable_experimental_features,
            ),
            worker_pool_size: env_parsed("QRELAY_WORKER_POOL_SIZE", defaults.worker_pool_size).max(1),
            queue_capacity: env_parsed("QRELAY_QUEUE_CAPACITY", defaults.queue_capacity).max(1),
            retry_backoff_base: Duration::from_secs(env_parsed(
                "QRELAY_RETRY_BACKOFF_SECONDS",
                defaults.retry_backoff_base.as_secs(),
            )),
            max_retry_attempts: env_parsed("QRELAY_MAX_RETRY_ATTEMPTS", defaults.max_retry_attempts).max(1),
        }
    }

    /// Looks up a per-provider token fallback, e.g. `QRELAY_TOKEN_IBM` for
    /// provider name `"ibm"` (spec §4.3's "token falls back to an
    /// environment variable when the caller doesn't supply one").
    pub fn provider_token(&self, provider: &str) -> Option<String> {
        std::env::var(format!("QRELAY_TOKEN_{}", provider.to_uppercase())).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = OrchestratorConfig::default();
        assert!(config.execute_asynchronously);
        assert!(config.worker_pool_size >= 1);
        assert!(config.max_retry_attempts >= 1);
    }

    #[test]
    fn worker_pool_size_is_clamped_to_at_least_one() {
        // SAFETY: single-threaded test process; env var scoped to this test.
        unsafe {
            std::env::set_var("QRELAY_WORKER_POOL_SIZE", "0");
        }
        let config = OrchestratorConfig::from_env();
        assert_eq!(config.worker_pool_size, 1);
        unsafe {
            std::env::remove_var("QRELAY_WORKER_POOL_SIZE");
        }
    }
}

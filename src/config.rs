//! Executor configuration with sensible defaults (§10.2).

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::telemetry::TelemetryConfig;

/// Default bound on the visible-update queue (§5).
pub const DEFAULT_VISIBLE_QUEUE_CAPACITY: usize = 20;

/// Default worker thread count (0 = let the pool decide, typically
/// CPU-count).
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Executor-wide configuration.
///
/// # Examples
/// ```rust
/// use bundle_exec::config::{ExecutorConfig, DEFAULT_VISIBLE_QUEUE_CAPACITY};
///
/// let config = ExecutorConfig::default();
/// assert_eq!(config.visible_queue_capacity, DEFAULT_VISIBLE_QUEUE_CAPACITY);
///
/// let config = ExecutorConfig::builder()
///     .with_visible_queue_capacity(50)
///     .build()
///     .unwrap();
/// assert_eq!(config.visible_queue_capacity, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Bound on the visible-update queue (§5).
    pub visible_queue_capacity: usize,

    /// Number of worker threads backing the pool; 0 means "let the pool
    /// decide" (typically number of available CPUs).
    pub worker_threads: usize,

    /// Telemetry configuration.
    pub telemetry: TelemetryConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            visible_queue_capacity: DEFAULT_VISIBLE_QUEUE_CAPACITY,
            worker_threads: DEFAULT_WORKER_THREADS,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ExecutorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.visible_queue_capacity == 0 {
            return Err("visible_queue_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

/// Builder for [`ExecutorConfig`].
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the visible-update queue bound.
    pub fn with_visible_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.visible_queue_capacity = capacity;
        self
    }

    /// Set the worker thread count.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    /// Set the telemetry configuration.
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<ExecutorConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The `getPipelineOptions()` collaborator return value (§6): used only for
/// naming/diagnostics, never for control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// The pipeline's application name, used in log/telemetry context.
    pub app_name: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            app_name: "unnamed-pipeline".to_string(),
        }
    }
}

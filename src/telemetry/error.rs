//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur during telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration error during telemetry initialization.
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Error recording an event.
    #[error("failed to record event: {message}")]
    Record {
        /// Error message describing the recording failure.
        message: String,
    },

    /// Error generating a snapshot.
    #[error("failed to generate snapshot: {message}")]
    Snapshot {
        /// Error message describing the snapshot failure.
        message: String,
    },

    /// Error resetting telemetry state.
    #[error("failed to reset telemetry: {message}")]
    Reset {
        /// Error message describing the reset failure.
        message: String,
    },
}

impl TelemetryError {
    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new record error.
    pub fn record(message: impl Into<String>) -> Self {
        Self::Record {
            message: message.into(),
        }
    }

    /// Creates a new snapshot error.
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }

    /// Creates a new reset error.
    pub fn reset(message: impl Into<String>) -> Self {
        Self::Reset {
            message: message.into(),
        }
    }

    /// True if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// True if this is a record error.
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }
}

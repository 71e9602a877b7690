//! Error types for helper invocations

use std::path::PathBuf;

/// Errors that can occur while talking to the native helper
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The helper executable could not be started
    #[error("Failed to launch peepit helper at {program}: {source}")]
    Spawn {
        /// Program that was invoked
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The helper did not finish within the configured timeout
    #[error("peepit helper timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The helper exited unsuccessfully without printing an envelope
    #[error("peepit helper failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Exit code, or -1 when terminated by a signal
        code: i32,
        /// Captured stderr output
        stderr: String,
    },

    /// The helper printed an envelope with `success: false`
    #[error("{message}")]
    Reported {
        /// Human readable message from the helper
        message: String,
        /// Machine readable error code, if any
        code: Option<String>,
        /// Additional detail text, if any
        details: Option<String>,
    },

    /// The helper output could not be decoded
    #[error("Failed to parse peepit helper output: {0}")]
    InvalidOutput(String),
}

/// Result type alias for helper operations
pub type Result<T> = std::result::Result<T, CaptureError>;

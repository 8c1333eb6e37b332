//! Error types for transcode orchestration.

use thiserror::Error;

use super::types::JobState;

/// Errors that can occur while planning, running or dispatching a transcode.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Caller-supplied playback parameters are invalid.
    #[error("Invalid option: {reason}")]
    InvalidOption { reason: String },

    /// The requested action is not allowed in the job's current state.
    #[error("Cannot {action} a job in state {state:?}")]
    InvalidState { state: JobState, action: &'static str },

    /// The engine could not be launched or its output directory prepared.
    #[error("Failed to start transcode: {reason}")]
    Spawn { reason: String },

    /// The source file could not be probed.
    #[error("Failed to probe media file: {reason}")]
    Probe { reason: String },

    /// Every liveness round against the remote host failed, or it refused the job.
    #[error("Remote transcode host unavailable after {attempts} attempt(s)")]
    RemoteUnavailable { attempts: u32 },

    /// The remote host answered the submission with an error status.
    #[error("Remote transcode host rejected the job: {reason}")]
    RemoteRejected { reason: String },

    /// HTTP client error while talking to the remote host.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a new invalid option error.
    pub fn invalid_option(reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            reason: reason.into(),
        }
    }

    /// Creates a new spawn error.
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::Spawn {
            reason: reason.into(),
        }
    }

    /// Creates a new probe error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::Probe {
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's parameters.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidOption { .. } | Self::InvalidState { .. })
    }
}

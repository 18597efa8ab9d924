//! Outcome and failure taxonomy for supervised invocations.

use crate::protocol::DecodeError;

/// Terminal result of a supervised run that raised no error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The worker exited cleanly.
    Success,
    /// The worker failed, but the specific cause was already surfaced on the
    /// diagnostic channel; no secondary error is raised for it.
    FailureReported,
}

impl Outcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Error type for supervisor operations.
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// The worker's stdout could not be decoded: the stream ended before EOT
    /// or reading it failed. Carries the credential-masked command line for
    /// diagnosis.
    #[error("failed to decode worker output: {source} (command: {command})")]
    Decode {
        #[source]
        source: DecodeError,
        command: String,
    },

    /// The worker exited non-zero with no specifically recognized signature.
    #[error("worker exited with a failure status: {stderr}")]
    ToolFailure {
        /// Captured stderr text, or a fixed marker when nothing was captured.
        stderr: String,
    },

    /// The worker process could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker's exit state could not be queried.
    #[error("failed to query worker state: {0}")]
    Wait(#[source] std::io::Error),

    /// The worker's stdout pipe was not available.
    #[error("worker stdout not available")]
    NoStdout,

    /// The worker's stderr pipe was not available.
    #[error("worker stderr not available")]
    NoStderr,

    /// A single-use command was run a second time.
    #[error("command already ran; build a fresh instance")]
    AlreadyRan,
}

impl SupervisorError {
    /// Whether this failure is in the infrastructure rather than the tool:
    /// infrastructure failures are the plausibly transient ones, so callers
    /// may choose to retry them.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Spawn(_) | Self::Wait(_) | Self::NoStdout | Self::NoStderr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_classification() {
        let spawn = SupervisorError::Spawn(std::io::Error::other("boom"));
        assert!(spawn.is_infrastructure());

        let tool = SupervisorError::ToolFailure {
            stderr: "bad input".to_string(),
        };
        assert!(!tool.is_infrastructure());

        let decode = SupervisorError::Decode {
            source: DecodeError::UnexpectedEof,
            command: "scantool".to_string(),
        };
        assert!(!decode.is_infrastructure());
    }

    #[test]
    fn decode_error_display_carries_command() {
        let err = SupervisorError::Decode {
            source: DecodeError::UnexpectedEof,
            command: "scantool, --password, *********".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("before EOT"));
        assert!(text.contains("*********"));
    }
}

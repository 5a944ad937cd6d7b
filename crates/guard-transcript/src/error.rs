// error.rs — Why a caller could not be resolved.
//
// Every variant is a reason to fall back to the orchestrator role; callers
// use `resolve_or_default` to make that mapping explicit.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving the role behind a tool call.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The hook input carried no transcript path.
    #[error("no transcript path supplied")]
    NoTranscript,

    /// The session transcript could not be opened.
    #[error("failed to read transcript at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The session has no sub-agent log directory.
    #[error("no sub-agent logs at {path}: {source}")]
    NoSubagentLogs {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No sub-agent log contains the tool call.
    #[error("tool call '{call_id}' not found in any sub-agent log")]
    CallNotFound { call_id: String },

    /// The agent id extraction pattern is not a valid regex.
    #[error("invalid agent id pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

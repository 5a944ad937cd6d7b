// error.rs — Error types for the policy subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or compiling a guard policy.
///
/// None of these ever reach the hook's caller: the binary maps each one to
/// a fallback (built-in policy, or an allow verdict) and logs it.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy file at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy file is not valid YAML for [`crate::PolicyConfig`].
    #[error("failed to parse policy file at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A path pattern or command signature is malformed.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

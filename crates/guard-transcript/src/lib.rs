//! # guard-transcript
//!
//! Caller resolution for agent-guard.
//!
//! A PreToolUse hook only receives an opaque tool-call id. This crate works
//! out which role issued it, using the session transcript and the per
//! sub-agent logs the agent runtime writes next to it.
//!
//! Resolution is best-effort: [`resolve_or_default`] turns every
//! [`ResolutionError`] into the orchestrator role, so a broken or missing
//! transcript can never crash the hook or grant a sub-agent's access.

pub mod correlation;
pub mod error;
pub mod resolver;

pub use correlation::{Correlations, DEFAULT_AGENT_ID_PATTERN, DISPATCH_TOOLS};
pub use error::ResolutionError;
pub use resolver::{resolve_or_default, CallerResolver, TranscriptResolver};

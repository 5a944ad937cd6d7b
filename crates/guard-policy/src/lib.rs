//! # guard-policy
//!
//! Routing policy for agent tool calls.
//!
//! Decides whether a tool call intercepted before execution may run, given
//! the role that issued it. The [`GuardEngine`] evaluates each request and
//! returns a [`Verdict`]: Allow, or Block with a reason for the agent.
//!
//! ## Key invariants
//!
//! - **Orchestrator delegates**: the main session may only edit protected
//!   (source/config/script) files that its own patterns list.
//! - **Roles are allow-listed**: a named sub-agent may only edit paths its
//!   patterns match. No entry means no file access.
//! - **Destructive commands blocked**: forced pushes, `gh pr merge` and
//!   `gh repo delete` are blocked for every caller.
//! - **One verdict per request**: evaluation never fails and never mutates
//!   state.

pub mod command_rules;
pub mod config;
pub mod engine;
pub mod error;
pub mod path_rules;
pub mod pattern;
pub mod request;
pub mod role;
pub mod verdict;

pub use command_rules::{CommandCheck, CommandRules};
pub use config::{PolicyConfig, UnresolvedCallers};
pub use engine::{EvaluationStep, EvaluationTrace, GuardEngine};
pub use error::PolicyError;
pub use path_rules::{PathCheck, PathRules};
pub use pattern::{matches, PathPattern};
pub use request::{ActionKind, GuardRequest, HookInput};
pub use role::{Role, ORCHESTRATOR_ROLE};
pub use verdict::Verdict;

// role.rs — The logical role that issued a tool call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role name the orchestrator goes by in transcripts and on the CLI.
pub const ORCHESTRATOR_ROLE: &str = "main";

/// Who issued the tool call being evaluated.
///
/// Roles are resolved fresh on every invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Role {
    /// The top-level session. Expected to delegate implementation edits.
    Orchestrator,
    /// A sub-agent whose declared type is known, e.g. "backend-developer".
    Named(String),
    /// A sub-agent that appears in the transcript tree but whose declared
    /// type could not be traced. Carries the agent id of its segment.
    Unresolved(String),
}

impl Role {
    /// Parse a role name as written on the command line or in a policy file.
    ///
    /// `main` (and the empty string) mean the orchestrator; `agent:<id>`
    /// means an unresolved sub-agent.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name == ORCHESTRATOR_ROLE {
            Role::Orchestrator
        } else if let Some(id) = name.strip_prefix("agent:") {
            Role::Unresolved(id.to_string())
        } else {
            Role::Named(name.to_string())
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Orchestrator => write!(f, "{}", ORCHESTRATOR_ROLE),
            Role::Named(name) => write!(f, "{}", name),
            Role::Unresolved(id) => write!(f, "agent:{}", id),
        }
    }
}

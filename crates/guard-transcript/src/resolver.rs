// resolver.rs — Which role issued a tool call.
//
// `CallerResolver` is the seam: the hook only needs `resolve(call_id,
// transcript) -> Result<Role, _>`. `TranscriptResolver` is the strategy that
// works from the files the agent runtime leaves on disk:
//
//   <dir>/<session>.jsonl                         main transcript
//   <dir>/<session>/subagents/agent-<id>.jsonl    one log per sub-agent
//
// The call id is looked for in the sub-agent logs; the log it turns up in
// names the agent id, and the main transcript maps that id to a role.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use guard_policy::Role;
use regex::Regex;
use serde_json::Value;

use crate::correlation::{content_items, Correlations, DEFAULT_AGENT_ID_PATTERN};
use crate::error::ResolutionError;

/// Resolves the role behind a tool call.
pub trait CallerResolver {
    /// Resolve `call_id` using the session transcript at `transcript`.
    ///
    /// An empty `call_id` always resolves to the orchestrator.
    fn resolve(&self, call_id: &str, transcript: Option<&Path>) -> Result<Role, ResolutionError>;
}

/// Resolve a caller, mapping every failure to the orchestrator role.
pub fn resolve_or_default(
    resolver: &dyn CallerResolver,
    call_id: &str,
    transcript: Option<&Path>,
) -> Role {
    match resolver.resolve(call_id, transcript) {
        Ok(role) => role,
        Err(e) => {
            tracing::debug!("caller resolved to orchestrator: {}", e);
            Role::Orchestrator
        }
    }
}

/// Resolves callers from session transcript files.
#[derive(Debug, Clone)]
pub struct TranscriptResolver {
    agent_id: Regex,
}

impl TranscriptResolver {
    /// A resolver using the default agent id pattern.
    pub fn new() -> Result<Self, ResolutionError> {
        Self::with_agent_id_pattern(DEFAULT_AGENT_ID_PATTERN)
    }

    /// A resolver with a custom agent id pattern. The first capture group
    /// must be the agent id.
    pub fn with_agent_id_pattern(pattern: &str) -> Result<Self, ResolutionError> {
        let agent_id = Regex::new(pattern).map_err(|e| ResolutionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { agent_id })
    }

    /// Directory holding the sub-agent logs of a session.
    pub fn subagents_dir(transcript: &Path) -> PathBuf {
        let parent = transcript.parent().unwrap_or_else(|| Path::new(""));
        let stem = transcript.file_stem().unwrap_or_default();
        parent.join(stem).join("subagents")
    }

    /// Sub-agent logs as `(agent id, path)`, sorted by file name.
    fn subagent_logs(dir: &Path) -> Result<Vec<(String, PathBuf)>, ResolutionError> {
        let entries = fs::read_dir(dir).map_err(|source| ResolutionError::NoSubagentLogs {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut logs: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?;
                let id = name.strip_prefix("agent-")?.strip_suffix(".jsonl")?;
                Some((id.to_string(), path.clone()))
            })
            .collect();
        logs.sort();
        Ok(logs)
    }
}

impl CallerResolver for TranscriptResolver {
    fn resolve(&self, call_id: &str, transcript: Option<&Path>) -> Result<Role, ResolutionError> {
        if call_id.is_empty() {
            return Ok(Role::Orchestrator);
        }
        let transcript = transcript.ok_or(ResolutionError::NoTranscript)?;

        // A missing main transcript only loses the id → role mapping; the
        // sub-agent logs can still show the call came from a sub-agent.
        let correlations = match Correlations::from_file(transcript, &self.agent_id) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("{}", e);
                Correlations::default()
            }
        };

        let dir = Self::subagents_dir(transcript);
        for (agent_id, path) in Self::subagent_logs(&dir)? {
            if !log_contains_call(&path, call_id) {
                continue;
            }
            // A sub-agent dispatched as `main` runs under the orchestrator's rules.
            let role = match correlations.role_for_agent(&agent_id) {
                Some(name) => Role::from_name(name),
                None => Role::Unresolved(agent_id),
            };
            tracing::debug!("tool call {} issued by {}", call_id, role);
            return Ok(role);
        }

        Err(ResolutionError::CallNotFound {
            call_id: call_id.to_string(),
        })
    }
}

/// Check whether any content item in a sub-agent log has `id == call_id`.
/// Unreadable files and malformed lines count as "not here".
fn log_contains_call(path: &Path, call_id: &str) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!("skipping sub-agent log {}: {}", path.display(), e);
            return false;
        }
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<Value>(&line).ok())
        .any(|entry| {
            content_items(&entry)
                .any(|item| item.get("id").and_then(Value::as_str) == Some(call_id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Role, fn() -> ResolutionError>);

    impl CallerResolver for Fixed {
        fn resolve(&self, _: &str, _: Option<&Path>) -> Result<Role, ResolutionError> {
            match &self.0 {
                Ok(role) => Ok(role.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    #[test]
    fn empty_call_id_is_orchestrator() {
        let resolver = TranscriptResolver::new().unwrap();
        assert_eq!(resolver.resolve("", None).unwrap(), Role::Orchestrator);
    }

    #[test]
    fn missing_transcript_path_is_an_error() {
        let resolver = TranscriptResolver::new().unwrap();
        assert!(matches!(
            resolver.resolve("toolu_1", None),
            Err(ResolutionError::NoTranscript)
        ));
    }

    #[test]
    fn every_error_defaults_to_orchestrator() {
        let errors: [fn() -> ResolutionError; 3] = [
            || ResolutionError::NoTranscript,
            || ResolutionError::CallNotFound {
                call_id: "x".to_string(),
            },
            || ResolutionError::NoSubagentLogs {
                path: PathBuf::from("/nowhere"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        ];
        for make in errors {
            let role = resolve_or_default(&Fixed(Err(make)), "toolu_1", None);
            assert_eq!(role, Role::Orchestrator);
        }
    }

    #[test]
    fn resolved_roles_pass_through() {
        let named = Role::Named("backend-qa".to_string());
        let role = resolve_or_default(&Fixed(Ok(named.clone())), "toolu_1", None);
        assert_eq!(role, named);
    }

    #[test]
    fn subagents_dir_sits_next_to_transcript() {
        assert_eq!(
            TranscriptResolver::subagents_dir(Path::new("/p/sessions/abc-123.jsonl")),
            PathBuf::from("/p/sessions/abc-123/subagents")
        );
    }

    #[test]
    fn invalid_agent_id_pattern_is_rejected() {
        assert!(matches!(
            TranscriptResolver::with_agent_id_pattern("agentId(["),
            Err(ResolutionError::InvalidPattern { .. })
        ));
    }
}

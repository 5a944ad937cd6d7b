// correlation.rs — Sub-agent ids and the roles they were dispatched as.
//
// The session transcript is JSONL: one entry per line, each with a
// `message.content` list. Two kinds of content items matter here:
//
//   {"type":"tool_use","name":"Task","id":"toolu_1","input":{"subagent_type":"backend-qa"}}
//   {"type":"tool_result","tool_use_id":"toolu_1","content":"... agentId: 3f9a ..."}
//
// The first records which role a dispatch asked for; the second reveals the
// agent id the runtime gave that dispatch. Together they map agent id → role.
// Lines that do not parse are skipped one at a time.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::error::ResolutionError;

/// Tool names the orchestrator uses to spawn a sub-agent.
pub const DISPATCH_TOOLS: &[&str] = &["Task", "Agent"];

/// Default pattern for the agent id in a dispatch's free-text result.
pub const DEFAULT_AGENT_ID_PATTERN: &str = r"agentId[:\s]+([a-f0-9]+)";

/// Correlations collected from one session transcript.
#[derive(Debug, Clone, Default)]
pub struct Correlations {
    /// Dispatch tool-use id → declared role.
    dispatches: HashMap<String, String>,
    /// Agent id → declared role.
    agents: HashMap<String, String>,
}

impl Correlations {
    /// Read a transcript file.
    pub fn from_file(path: &Path, agent_id: &Regex) -> Result<Self, ResolutionError> {
        let file = File::open(path).map_err(|source| ResolutionError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file), agent_id))
    }

    /// Read transcript lines from any buffered source.
    pub fn from_reader(reader: impl BufRead, agent_id: &Regex) -> Self {
        let mut correlations = Self::default();
        for (line_num, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::debug!("transcript read stopped at line {}: {}", line_num + 1, e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(entry) => correlations.record_entry(&entry, agent_id),
                Err(e) => tracing::debug!("skipping transcript line {}: {}", line_num + 1, e),
            }
        }
        correlations
    }

    /// The role an agent id was dispatched as.
    pub fn role_for_agent(&self, agent_id: &str) -> Option<&str> {
        self.agents.get(agent_id).map(String::as_str)
    }

    /// Number of agent ids traced back to a role.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn record_entry(&mut self, entry: &Value, agent_id: &Regex) {
        for item in content_items(entry) {
            if let Some((id, role)) = dispatch_of(item) {
                self.dispatches.insert(id.to_string(), role.to_string());
            }

            if item.get("type").and_then(Value::as_str) != Some("tool_result") {
                continue;
            }
            let result_id = item
                .get("tool_use_id")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(role) = self.dispatches.get(result_id).cloned() else {
                continue;
            };

            // Prefer the structured field when the runtime provides one.
            let structured = entry
                .get("toolUseResult")
                .and_then(|r| r.get("agentId"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let found = structured.or_else(|| {
                let text = result_text(item.get("content"));
                agent_id
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            });

            if let Some(id) = found {
                tracing::debug!("agent {} dispatched as {}", id, role);
                self.agents.insert(id, role);
            }
        }
    }
}

/// The `message.content` items of a transcript entry, if it has a list.
pub(crate) fn content_items(entry: &Value) -> impl Iterator<Item = &Value> {
    entry
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

/// `(tool_use id, subagent_type)` if the item dispatches a sub-agent.
fn dispatch_of(item: &Value) -> Option<(&str, &str)> {
    let name = item.get("name").and_then(Value::as_str)?;
    if !DISPATCH_TOOLS.contains(&name) {
        return None;
    }
    let id = item.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())?;
    let role = item
        .get("input")
        .and_then(|i| i.get("subagent_type"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    Some((id, role))
}

/// Text of a tool result: a plain string, or the `text` parts of a list.
fn result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

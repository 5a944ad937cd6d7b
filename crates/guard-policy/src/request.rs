// request.rs — Hook input and the decision request derived from it.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tools that write to a file.
pub const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

/// Tools that run a shell command.
pub const SHELL_TOOLS: &[&str] = &["Bash"];

/// The raw PreToolUse payload as the agent runtime sends it.
///
/// Every field is optional on the wire. A missing, null or non-string field
/// reads as empty on its own; the rest of the payload is still used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookInput {
    #[serde(deserialize_with = "lenient_string")]
    pub tool_name: String,
    pub tool_input: Value,
    #[serde(deserialize_with = "lenient_string")]
    pub tool_use_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub transcript_path: String,
    /// Working directory of the session; used as the project root.
    #[serde(deserialize_with = "lenient_optional_string")]
    pub cwd: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl HookInput {
    /// Parse a payload. Anything that is not a JSON object becomes an empty
    /// input rather than an error.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!("unreadable hook input, treating as empty: {}", e);
                Self::default()
            }
        }
    }

    fn input_str(&self, key: &str) -> Option<String> {
        self.tool_input
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// What kind of action the tool call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    FileEdit,
    ShellCommand,
    Other,
}

/// A single decision request, built fresh per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRequest {
    pub tool_name: String,
    pub action: ActionKind,
    pub target_path: Option<String>,
    pub command: Option<String>,
    /// Opaque id of this tool call, used to find who issued it.
    pub call_id: String,
    /// Session transcript the call id is looked up in.
    pub transcript_path: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
}

impl GuardRequest {
    /// Classify a hook payload.
    pub fn from_hook_input(input: &HookInput) -> Self {
        let tool = input.tool_name.as_str();
        let (action, target_path, command) = if EDIT_TOOLS.contains(&tool) {
            let path = input
                .input_str("file_path")
                .or_else(|| input.input_str("notebook_path"));
            (ActionKind::FileEdit, path, None)
        } else if SHELL_TOOLS.contains(&tool) {
            (ActionKind::ShellCommand, None, input.input_str("command"))
        } else {
            (ActionKind::Other, None, None)
        };

        Self {
            tool_name: input.tool_name.clone(),
            action,
            target_path,
            command,
            call_id: input.tool_use_id.trim().to_string(),
            transcript_path: non_empty_path(&input.transcript_path),
            project_root: input.cwd.as_deref().and_then(non_empty_path),
        }
    }

    /// A file edit request, for the CLI and tests.
    pub fn file_edit(path: impl Into<String>) -> Self {
        Self {
            tool_name: "Edit".to_string(),
            action: ActionKind::FileEdit,
            target_path: Some(path.into()),
            command: None,
            call_id: String::new(),
            transcript_path: None,
            project_root: None,
        }
    }

    /// A shell command request, for the CLI and tests.
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            tool_name: "Bash".to_string(),
            action: ActionKind::ShellCommand,
            target_path: None,
            command: Some(command.into()),
            call_id: String::new(),
            transcript_path: None,
            project_root: None,
        }
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

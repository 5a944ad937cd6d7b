// verdict.rs — The hook's single output.

use serde::{Deserialize, Serialize};

/// The result of evaluating one tool call.
///
/// Serializes to exactly what the hook protocol expects:
/// `{"decision":"allow"}` or `{"decision":"block","reason":"..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Verdict {
    /// The action may proceed.
    Allow,
    /// The action must not run. The reason is shown to the calling agent.
    Block { reason: String },
}

impl Verdict {
    pub fn block(reason: impl Into<String>) -> Self {
        Verdict::Block {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Allow => None,
            Verdict::Block { reason } => Some(reason),
        }
    }

    /// Render as a single JSON line for stdout.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            // Unreachable for these two variants, but the hook must print something.
            Err(_) => r#"{"decision":"allow"}"#.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn allow_has_no_reason_field() {
        let json: Value = serde_json::from_str(&Verdict::Allow.to_json()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["decision"], "allow");
    }

    #[test]
    fn block_carries_reason() {
        let json: Value =
            serde_json::from_str(&Verdict::block("BLOCKED: nope").to_json()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["decision"], "block");
        assert_eq!(obj["reason"], "BLOCKED: nope");
    }

    #[test]
    fn output_parses_back() {
        let verdict = Verdict::block("reason");
        let restored: Verdict = serde_json::from_str(&verdict.to_json()).unwrap();
        assert_eq!(restored, verdict);
        assert!(!restored.is_allowed());
        assert_eq!(restored.reason(), Some("reason"));
    }
}

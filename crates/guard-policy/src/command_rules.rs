// command_rules.rs — Destructive shell command signatures.
//
// This is a fixed deny-list matched with regexes over the raw command text,
// not a shell parse. It catches the commands as an agent normally writes
// them, including inside `&&` chains, and lets everything else through.

use regex::Regex;

use crate::error::PolicyError;
use crate::verdict::Verdict;

/// One deny signature.
#[derive(Debug, Clone)]
pub struct CommandSignature {
    /// Short name used in traces (e.g. "git-force-push").
    pub name: &'static str,
    regex: Regex,
    reason: &'static str,
}

impl CommandSignature {
    fn new(name: &'static str, pattern: &str, reason: &'static str) -> Result<Self, PolicyError> {
        let regex = Regex::new(pattern).map_err(|e| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            regex,
            reason,
        })
    }

    pub fn is_match(&self, command: &str) -> bool {
        self.regex.is_match(command)
    }
}

/// Outcome of a command check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCheck {
    pub verdict: Verdict,
    /// Name of the signature that matched, if any.
    pub signature: Option<&'static str>,
}

/// The compiled deny-list.
#[derive(Debug, Clone)]
pub struct CommandRules {
    signatures: Vec<CommandSignature>,
}

impl CommandRules {
    /// The built-in signatures, checked in order.
    pub fn builtin() -> Result<Self, PolicyError> {
        Ok(Self {
            signatures: vec![
                // `git push` followed anywhere by --force / --force-with-lease, or a
                // short-flag cluster containing `f` (-f, -fu, -uf). The flag may be
                // glued to a following shell operator (`--force;`, `-f&&`, `--force)`).
                CommandSignature::new(
                    "git-force-push",
                    r"\bgit\s+push\b[^;&|\n]*?\s(?:-[A-Za-z]*f[A-Za-z]*|--force(?:-with-lease|-if-includes)?)(?:[\s=;&|)]|$)",
                    "BLOCKED: git push --force is not allowed. Use regular git push.",
                )?,
                CommandSignature::new(
                    "gh-pr-merge",
                    r"\bgh\s+pr\s+merge\b",
                    "BLOCKED: gh pr merge is not allowed. PRs must be merged via GitHub UI.",
                )?,
                CommandSignature::new(
                    "gh-repo-delete",
                    r"\bgh\s+repo\s+delete\b",
                    "BLOCKED: gh repo delete is not allowed.",
                )?,
            ],
        })
    }

    pub fn signatures(&self) -> &[CommandSignature] {
        &self.signatures
    }

    /// Check a shell command against every signature.
    pub fn check(&self, command: &str) -> CommandCheck {
        match self.signatures.iter().find(|s| s.is_match(command)) {
            Some(signature) => CommandCheck {
                verdict: Verdict::block(signature.reason),
                signature: Some(signature.name),
            },
            None => CommandCheck {
                verdict: Verdict::Allow,
                signature: None,
            },
        }
    }
}

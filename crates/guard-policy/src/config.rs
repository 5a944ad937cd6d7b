// config.rs — Routing policy configuration.
//
// The policy is a plain value: protected extensions, the orchestrator's own
// allow-list, and one allow-list per named sub-agent role. It is built once
// at startup (from the built-in table or a YAML file) and passed by
// reference to the rule engines.
//
// A YAML file only needs the fields it wants to change; anything missing
// falls back to the built-in table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// What to do with edits from sub-agents whose role could not be traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedCallers {
    /// Let the edit through (and log it). Keeps nested delegation working.
    #[default]
    Allow,
    /// Treat the caller as having no file access.
    Block,
}

impl UnresolvedCallers {
    /// The name used in policy files.
    pub fn as_str(self) -> &'static str {
        match self {
            UnresolvedCallers::Allow => "allow",
            UnresolvedCallers::Block => "block",
        }
    }
}

/// The routing policy.
///
/// ```yaml
/// protected_extensions: [".cs", ".ts"]
/// orchestrator: ["CLAUDE.md", "docs/plan/*.md"]
/// roles:
///   frontend-developer: ["services/admin-dashboard/**"]
///   git-commit-helper: []
/// unresolved_callers: allow
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Extensions the orchestrator must delegate. Compared case-insensitively,
    /// with or without the leading dot.
    pub protected_extensions: Vec<String>,

    /// Protected files the orchestrator may still edit itself.
    pub orchestrator: Vec<String>,

    /// Role name → patterns that role may edit. A missing role, or one with
    /// an empty list, may not edit anything.
    pub roles: BTreeMap<String, Vec<String>>,

    /// Handling for sub-agents with an untraceable role.
    pub unresolved_callers: UnresolvedCallers,
}

impl PolicyConfig {
    /// Load a policy from a YAML file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| PolicyError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from file if it exists, otherwise use the built-in policy.
    ///
    /// An unreadable or malformed file also falls back to the built-in
    /// policy; the hook must answer either way.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::debug!("loaded policy from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}; using built-in policy", e);
                Self::default()
            }
        }
    }

    /// Patterns granted to a named role, or `None` if the role has no entry.
    pub fn role_patterns(&self, role: &str) -> Option<&[String]> {
        self.roles.get(role).map(Vec::as_slice)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let roles: BTreeMap<String, Vec<String>> = [
            (
                "claude-code-hacker",
                &[".claude/**", ".mcp.json", "scripts/*-guard.sh", "CLAUDE.md"][..],
            ),
            (
                "frontend-developer",
                &["services/admin-dashboard/**", "services/web-portal/**"][..],
            ),
            (
                "frontend-qa",
                &[
                    "services/admin-dashboard/**/*.test.tsx",
                    "services/admin-dashboard/**/*.test.ts",
                    "services/admin-dashboard/**/*.spec.tsx",
                    "services/admin-dashboard/**/*.spec.ts",
                    "services/web-portal/**/*.test.*",
                    "services/web-portal/**/*.spec.*",
                ][..],
            ),
            (
                "backend-developer",
                &[
                    "services/**/*.cs",
                    "src/shared/**/*.cs",
                    "services/db/migrations_v2/**",
                ][..],
            ),
            (
                "backend-qa",
                &["tests/**/*.cs", "testing/**/*.ps1", "testing/**/*.sh"][..],
            ),
            ("platform-windows-developer", &["agent/windows/**"][..]),
            ("platform-linux-developer", &["agent/linux/**"][..]),
            ("platform-macos-developer", &["agent/macos/**"][..]),
            ("platform-lead-developer", &["agent/shared/**"][..]),
            (
                "platform-qa",
                &[
                    "agent/windows/tests/**",
                    "agent/linux/tests/**",
                    "agent/macos/tests/**",
                ][..],
            ),
            (
                "platform-build-engineer",
                &[
                    "agent/**/*.wixproj",
                    "agent/**/*.wxs",
                    "agent/**/packaging/**",
                ][..],
            ),
            (
                "devops-engineer",
                &["docker-compose*.yml", "Dockerfile*", ".github/workflows/**"][..],
            ),
            (
                "code-refactorer",
                &["services/**", "src/**", "agent/**", "tests/**"][..],
            ),
            // Commits only, no file edits.
            ("git-commit-helper", &[][..]),
            ("ui-design-lead", &["docs/plan/*/design/**"][..]),
            ("ui-design-ux", &["docs/plan/*/design/**"][..]),
        ]
        .into_iter()
        .map(|(role, patterns)| (role.to_string(), strings(patterns)))
        .collect();

        Self {
            protected_extensions: strings(&[
                ".cs", ".tsx", ".ts", ".js", ".jsx", ".json", ".yml", ".yaml", ".sql", ".scss",
                ".css", ".html", ".xml", ".sh", ".ps1", ".py", ".csproj", ".sln", ".props",
                ".targets",
            ]),
            orchestrator: strings(&[
                "CLAUDE.md",
                "docs/plan/*.md",
                "~/.claude/plans/*.md",
                ".claude/*.md",
                ".claude/**/*.md",
                ".claude/**/*.json",
            ]),
            roles,
            unresolved_callers: UnresolvedCallers::Allow,
        }
    }
}

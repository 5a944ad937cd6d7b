// path_rules.rs — Who may edit which file.
//
// 1. Orchestrator: unprotected files are fine; protected files only if they
//    match one of the orchestrator's own patterns.
// 2. Named role: the file must match one of the role's patterns, whatever
//    its extension. No entry (or an empty one) means no file access.
// 3. Unresolved sub-agent: exempt unless the policy says otherwise.
//
// Patterns are compiled once when the rules are built. A pattern that fails
// to compile is logged and dropped, so it never grants anything.
//
// `.` and `..` in the target are resolved before matching, so an allowed
// prefix cannot be used to reach outside it. A target that climbs above its
// own start matches no pattern.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{PolicyConfig, UnresolvedCallers};
use crate::pattern::{expand_home, normalize_path, resolve_path, PathPattern};
use crate::role::Role;
use crate::verdict::Verdict;

/// Outcome of a path check, with enough detail to explain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    pub verdict: Verdict,
    /// Whether the target has a protected extension.
    pub protected: bool,
    /// Number of patterns consulted for the caller's role.
    pub patterns_checked: usize,
    /// The pattern that granted access, if one did.
    pub matched_pattern: Option<String>,
    /// The target with `.` and `..` resolved; `None` if it climbs above its
    /// start.
    pub resolved_path: Option<String>,
}

/// Compiled path rules for one policy.
#[derive(Debug, Clone)]
pub struct PathRules {
    protected_extensions: Vec<String>,
    orchestrator: Vec<PathPattern>,
    roles: BTreeMap<String, Vec<PathPattern>>,
    unresolved_callers: UnresolvedCallers,
}

impl PathRules {
    /// Compile the path rules of a policy, expanding `~` against `home`.
    pub fn new(config: &PolicyConfig, home: Option<&Path>) -> Self {
        Self {
            protected_extensions: config
                .protected_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            orchestrator: compile_all(&config.orchestrator, home),
            roles: config
                .roles
                .iter()
                .map(|(role, patterns)| (role.clone(), compile_all(patterns, home)))
                .collect(),
            unresolved_callers: config.unresolved_callers,
        }
    }

    /// Check whether a path has a protected extension.
    pub fn is_protected(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        let name = normalized.rsplit('/').next().unwrap_or_default();
        match Path::new(name).extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                self.protected_extensions.iter().any(|p| *p == ext)
            }
            None => false,
        }
    }

    /// Decide whether `role` may edit `path`.
    ///
    /// When `project_root` is given and the path lies under it, patterns are
    /// tried against the project-relative form as well as the path as given.
    pub fn check(&self, role: &Role, path: &str, project_root: Option<&Path>) -> PathCheck {
        let protected = self.is_protected(path);
        let resolved_path = resolve_path(path);
        let candidates = match &resolved_path {
            Some(resolved) => candidate_forms(resolved, project_root),
            None => Vec::new(),
        };

        match role {
            Role::Orchestrator => {
                if !protected {
                    return PathCheck {
                        verdict: Verdict::Allow,
                        protected,
                        patterns_checked: 0,
                        matched_pattern: None,
                        resolved_path,
                    };
                }
                let matched = first_match(&self.orchestrator, &candidates);
                let verdict = if matched.is_some() {
                    Verdict::Allow
                } else {
                    Verdict::block(format!(
                        "ORCHESTRATOR MODE: Cannot edit code file '{}'. \
                         Delegate to appropriate agent via /act or Task tool.",
                        path
                    ))
                };
                PathCheck {
                    verdict,
                    protected,
                    patterns_checked: self.orchestrator.len(),
                    matched_pattern: matched,
                    resolved_path,
                }
            }
            Role::Named(name) => {
                let patterns = self.roles.get(name).map(Vec::as_slice).unwrap_or_default();
                let matched = first_match(patterns, &candidates);
                let verdict = if matched.is_some() {
                    Verdict::Allow
                } else {
                    Verdict::block(format!(
                        "ROUTING VIOLATION: Agent '{}' cannot edit '{}'. \
                         Check the routing policy for allowed patterns.",
                        name, path
                    ))
                };
                PathCheck {
                    verdict,
                    protected,
                    patterns_checked: patterns.len(),
                    matched_pattern: matched,
                    resolved_path,
                }
            }
            Role::Unresolved(agent_id) => {
                let verdict = match self.unresolved_callers {
                    UnresolvedCallers::Allow => {
                        tracing::warn!(
                            "agent {} has no traceable role; edit of '{}' not enforced",
                            agent_id,
                            path
                        );
                        Verdict::Allow
                    }
                    UnresolvedCallers::Block => Verdict::block(format!(
                        "ROUTING VIOLATION: Agent 'agent:{}' has no traceable role \
                         and cannot edit '{}'.",
                        agent_id, path
                    )),
                };
                PathCheck {
                    verdict,
                    protected,
                    patterns_checked: 0,
                    matched_pattern: None,
                    resolved_path,
                }
            }
        }
    }
}

fn compile_all(patterns: &[String], home: Option<&Path>) -> Vec<PathPattern> {
    patterns
        .iter()
        .filter_map(|raw| match PathPattern::new(&expand_home(raw, home)) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("skipping routing pattern: {}", e);
                None
            }
        })
        .collect()
}

fn first_match(patterns: &[PathPattern], candidates: &[String]) -> Option<String> {
    patterns
        .iter()
        .find(|p| candidates.iter().any(|c| p.matches(c)))
        .map(|p| p.as_str().to_string())
}

/// The forms of a resolved `path` to try against patterns: the path itself
/// and, when it lies under the project root, the project-relative path.
fn candidate_forms(path: &str, project_root: Option<&Path>) -> Vec<String> {
    let normalized = normalize_path(path);
    let mut forms = vec![normalized.clone()];

    if let Some(root) = project_root {
        let root = resolve_path(&root.to_string_lossy()).unwrap_or_default();
        if !root.is_empty() && root != "/" {
            let relative = normalized
                .strip_prefix(&root)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty());
            if let Some(relative) = relative {
                forms.push(relative.to_string());
            }
        }
    }
    forms
}

// engine.rs — Guard evaluation engine.
//
// Every intercepted tool call passes through `evaluate()` which checks:
//
// 1. Is it a file edit? → path rules for the caller's role
// 2. Is it a shell command? → destructive command signatures
// 3. Anything else → Allow
//
// The caller's role is resolved before the engine is called; the engine
// itself is a pure function of (policy, request, role), so evaluating the
// same request twice always yields the same verdict.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command_rules::CommandRules;
use crate::config::PolicyConfig;
use crate::error::PolicyError;
use crate::path_rules::PathRules;
use crate::pattern::normalize_path;
use crate::request::{ActionKind, GuardRequest};
use crate::role::Role;
use crate::verdict::Verdict;

/// A step in the evaluation chain.
///
/// Captures what the engine checked at each stage so a decision can be
/// explained after the fact (`agent-guard check-path --explain`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationStep {
    /// Which check was performed (e.g., "action_kind", "protected_extension").
    pub check: String,
    /// The outcome of this check (e.g., "file_edit", "matched 'src/**'").
    pub outcome: String,
    /// Whether this step was the terminal decision point.
    pub terminal: bool,
}

impl EvaluationStep {
    fn new(check: &str, outcome: impl Into<String>, terminal: bool) -> Self {
        Self {
            check: check.to_string(),
            outcome: outcome.into(),
            terminal,
        }
    }
}

/// Full evaluation trace returned alongside a verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationTrace {
    /// The final decision.
    pub decision: Verdict,
    /// The role the request was evaluated for.
    pub role: Role,
    /// Ordered steps the engine evaluated.
    pub steps: Vec<EvaluationStep>,
    /// The path pattern or command signature that decided the outcome.
    pub matched_rule: Option<String>,
}

/// The guard engine — evaluates requests against a compiled policy.
#[derive(Debug, Clone)]
pub struct GuardEngine {
    config: PolicyConfig,
    paths: PathRules,
    commands: CommandRules,
}

impl GuardEngine {
    /// Compile a policy. `home` is used to expand `~` in patterns.
    pub fn new(config: PolicyConfig, home: Option<&Path>) -> Result<Self, PolicyError> {
        let paths = PathRules::new(&config, home);
        let commands = CommandRules::builtin()?;
        Ok(Self {
            config,
            paths,
            commands,
        })
    }

    /// Compile a policy against the current user's home directory.
    pub fn with_user_home(config: PolicyConfig) -> Result<Self, PolicyError> {
        let home: Option<PathBuf> = dirs::home_dir();
        Self::new(config, home.as_deref())
    }

    /// The policy this engine was built from.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Evaluate a request issued by `role`.
    pub fn evaluate(&self, request: &GuardRequest, role: &Role) -> Verdict {
        self.evaluate_with_trace(request, role).decision
    }

    /// Evaluate a request and record every step taken.
    pub fn evaluate_with_trace(&self, request: &GuardRequest, role: &Role) -> EvaluationTrace {
        let mut steps = Vec::new();

        let trace = match request.action {
            ActionKind::FileEdit => {
                steps.push(EvaluationStep::new("action_kind", "file_edit", false));
                self.evaluate_edit(request, role, steps)
            }
            ActionKind::ShellCommand => {
                steps.push(EvaluationStep::new("action_kind", "shell_command", false));
                self.evaluate_command(request, role, steps)
            }
            ActionKind::Other => {
                steps.push(EvaluationStep::new(
                    "action_kind",
                    format!("other ({}): not guarded", request.tool_name),
                    true,
                ));
                EvaluationTrace {
                    decision: Verdict::Allow,
                    role: role.clone(),
                    steps,
                    matched_rule: None,
                }
            }
        };

        if let Verdict::Block { reason } = &trace.decision {
            tracing::info!(role = %role, tool = %request.tool_name, "blocked: {}", reason);
        }
        trace
    }

    fn evaluate_edit(
        &self,
        request: &GuardRequest,
        role: &Role,
        mut steps: Vec<EvaluationStep>,
    ) -> EvaluationTrace {
        let Some(path) = request.target_path.as_deref() else {
            steps.push(EvaluationStep::new(
                "target_path",
                "missing: nothing to check",
                true,
            ));
            return EvaluationTrace {
                decision: Verdict::Allow,
                role: role.clone(),
                steps,
                matched_rule: None,
            };
        };

        steps.push(EvaluationStep::new("role", role.to_string(), false));

        let check = self
            .paths
            .check(role, path, request.project_root.as_deref());

        match &check.resolved_path {
            Some(resolved) if *resolved == normalize_path(path) => {}
            Some(resolved) => steps.push(EvaluationStep::new(
                "path_resolution",
                format!("resolved to '{}'", resolved),
                false,
            )),
            None => steps.push(EvaluationStep::new(
                "path_resolution",
                "climbs above its start: no pattern can match",
                false,
            )),
        }

        let unprotected_orchestrator_edit = *role == Role::Orchestrator && !check.protected;
        steps.push(EvaluationStep::new(
            "protected_extension",
            if check.protected {
                format!("'{}' is protected", path)
            } else {
                format!("'{}' is not protected", path)
            },
            unprotected_orchestrator_edit,
        ));

        if !unprotected_orchestrator_edit {
            let outcome = match (role, &check.matched_pattern) {
                (Role::Unresolved(_), _) => format!(
                    "unresolved caller: {}",
                    self.config.unresolved_callers.as_str()
                ),
                (_, Some(pattern)) => format!("matched '{}'", pattern),
                (_, None) => format!("no match in {} patterns", check.patterns_checked),
            };
            steps.push(EvaluationStep::new("pattern_match", outcome, true));
        }

        EvaluationTrace {
            decision: check.verdict,
            role: role.clone(),
            steps,
            matched_rule: check.matched_pattern,
        }
    }

    fn evaluate_command(
        &self,
        request: &GuardRequest,
        role: &Role,
        mut steps: Vec<EvaluationStep>,
    ) -> EvaluationTrace {
        let command = request.command.as_deref().unwrap_or_default();
        let check = self.commands.check(command);

        steps.push(EvaluationStep::new(
            "command_signature",
            match check.signature {
                Some(name) => format!("matched {}", name),
                None => format!("no match in {} signatures", self.commands.signatures().len()),
            },
            true,
        ));

        EvaluationTrace {
            decision: check.verdict,
            role: role.clone(),
            steps,
            matched_rule: check.signature.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnresolvedCallers;

    fn engine() -> GuardEngine {
        GuardEngine::new(PolicyConfig::default(), Some(Path::new("/home/dev"))).unwrap()
    }

    fn named(role: &str) -> Role {
        Role::Named(role.to_string())
    }

    fn other(tool: &str) -> GuardRequest {
        GuardRequest {
            tool_name: tool.to_string(),
            action: ActionKind::Other,
            target_path: Some("src/main.ts".to_string()),
            command: Some("git push --force".to_string()),
            call_id: String::new(),
            transcript_path: None,
            project_root: None,
        }
    }

    #[test]
    fn unguarded_tools_always_allowed() {
        let engine = engine();
        for role in [
            Role::Orchestrator,
            named("git-commit-helper"),
            Role::Unresolved("x".to_string()),
        ] {
            for tool in ["Read", "Grep", "WebFetch", ""] {
                assert_eq!(engine.evaluate(&other(tool), &role), Verdict::Allow);
            }
        }
    }

    #[test]
    fn orchestrator_edits_follow_extension_and_patterns() {
        let engine = engine();
        let main = Role::Orchestrator;

        assert!(engine.evaluate(&GuardRequest::file_edit("notes.txt"), &main).is_allowed());
        assert!(engine.evaluate(&GuardRequest::file_edit("docs/guide.md"), &main).is_allowed());
        assert!(engine
            .evaluate(&GuardRequest::file_edit(".claude/settings.json"), &main)
            .is_allowed());
        assert!(!engine.evaluate(&GuardRequest::file_edit("src/index.ts"), &main).is_allowed());
        assert!(!engine.evaluate(&GuardRequest::file_edit("package.json"), &main).is_allowed());
    }

    #[test]
    fn named_role_edits_follow_patterns() {
        let engine = engine();
        let dev = named("frontend-developer");

        assert!(engine
            .evaluate(&GuardRequest::file_edit("services/web-portal/src/page.tsx"), &dev)
            .is_allowed());
        assert!(!engine
            .evaluate(&GuardRequest::file_edit("agent/linux/main.c"), &dev)
            .is_allowed());
    }

    #[test]
    fn edit_without_target_path_is_allowed() {
        let engine = engine();
        let mut request = GuardRequest::file_edit("");
        request.target_path = None;
        assert_eq!(
            engine.evaluate(&request, &named("git-commit-helper")),
            Verdict::Allow
        );
    }

    #[test]
    fn shell_commands_checked_for_every_role() {
        let engine = engine();
        for role in [
            Role::Orchestrator,
            named("devops-engineer"),
            Role::Unresolved("abc".to_string()),
        ] {
            assert!(!engine
                .evaluate(&GuardRequest::shell("git push --force origin main"), &role)
                .is_allowed());
            assert!(!engine
                .evaluate(&GuardRequest::shell("gh pr merge 42"), &role)
                .is_allowed());
            assert!(engine
                .evaluate(&GuardRequest::shell("git push origin main"), &role)
                .is_allowed());
        }
    }

    #[test]
    fn shell_without_command_is_allowed() {
        let mut request = GuardRequest::shell("");
        request.command = None;
        assert_eq!(engine().evaluate(&request, &Role::Orchestrator), Verdict::Allow);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = engine();
        let request = GuardRequest::file_edit("services/api/Program.cs");
        let role = named("frontend-developer");
        let first = engine.evaluate_with_trace(&request, &role);
        let second = engine.evaluate_with_trace(&request, &role);
        assert_eq!(first, second);
    }

    #[test]
    fn unresolved_policy_switch_is_honored() {
        let config = PolicyConfig {
            unresolved_callers: UnresolvedCallers::Block,
            ..PolicyConfig::default()
        };
        let engine = GuardEngine::new(config, None).unwrap();
        let role = Role::Unresolved("feed".to_string());
        assert!(!engine
            .evaluate(&GuardRequest::file_edit("src/a.ts"), &role)
            .is_allowed());
    }

    // ── Evaluation trace tests ──

    #[test]
    fn trace_records_orchestrator_block() {
        let trace = engine().evaluate_with_trace(
            &GuardRequest::file_edit("src/index.ts"),
            &Role::Orchestrator,
        );

        assert!(!trace.decision.is_allowed());
        let checks: Vec<&str> = trace.steps.iter().map(|s| s.check.as_str()).collect();
        assert_eq!(
            checks,
            ["action_kind", "role", "protected_extension", "pattern_match"]
        );
        assert!(trace.steps.last().unwrap().terminal);
        assert!(trace.steps[..3].iter().all(|s| !s.terminal));
        assert_eq!(trace.matched_rule, None);
    }

    #[test]
    fn trace_stops_at_unprotected_extension_for_orchestrator() {
        let trace =
            engine().evaluate_with_trace(&GuardRequest::file_edit("README.md"), &Role::Orchestrator);
        assert_eq!(trace.decision, Verdict::Allow);
        let last = trace.steps.last().unwrap();
        assert_eq!(last.check, "protected_extension");
        assert!(last.terminal);
    }

    #[test]
    fn trace_names_matching_pattern() {
        let trace = engine().evaluate_with_trace(
            &GuardRequest::file_edit("tests/Api/UserTests.cs"),
            &named("backend-qa"),
        );
        assert_eq!(trace.decision, Verdict::Allow);
        assert_eq!(trace.matched_rule.as_deref(), Some("tests/**/*.cs"));
    }

    #[test]
    fn trace_records_dot_dot_resolution() {
        let trace = engine().evaluate_with_trace(
            &GuardRequest::file_edit(".claude/../src/config.json"),
            &Role::Orchestrator,
        );
        assert!(!trace.decision.is_allowed());
        let step = trace
            .steps
            .iter()
            .find(|s| s.check == "path_resolution")
            .unwrap();
        assert_eq!(step.outcome, "resolved to 'src/config.json'");
        assert!(!step.terminal);

        let trace = engine()
            .evaluate_with_trace(&GuardRequest::file_edit("../x.cs"), &named("code-refactorer"));
        assert!(!trace.decision.is_allowed());
        assert!(trace
            .steps
            .iter()
            .any(|s| s.check == "path_resolution" && s.outcome.contains("climbs above")));
    }

    #[test]
    fn plain_paths_have_no_resolution_step() {
        let trace = engine()
            .evaluate_with_trace(&GuardRequest::file_edit("./src/a.ts"), &Role::Orchestrator);
        assert!(trace.steps.iter().all(|s| s.check != "path_resolution"));
    }

    #[test]
    fn unresolved_trace_uses_policy_vocabulary() {
        let role = Role::Unresolved("feed".to_string());
        let trace = engine().evaluate_with_trace(&GuardRequest::file_edit("src/a.ts"), &role);
        assert_eq!(trace.steps.last().unwrap().outcome, "unresolved caller: allow");

        let config = PolicyConfig {
            unresolved_callers: UnresolvedCallers::Block,
            ..PolicyConfig::default()
        };
        let trace = GuardEngine::new(config, None)
            .unwrap()
            .evaluate_with_trace(&GuardRequest::file_edit("src/a.ts"), &role);
        assert_eq!(trace.steps.last().unwrap().outcome, "unresolved caller: block");
    }

    #[test]
    fn trace_names_command_signature() {
        let trace = engine()
            .evaluate_with_trace(&GuardRequest::shell("gh repo delete a/b"), &Role::Orchestrator);
        assert_eq!(trace.matched_rule.as_deref(), Some("gh-repo-delete"));
        assert_eq!(trace.steps.len(), 2);
    }

    #[test]
    fn trace_serialization_round_trip() {
        let trace = engine().evaluate_with_trace(
            &GuardRequest::file_edit("services/api/Program.cs"),
            &named("backend-developer"),
        );
        let json = serde_json::to_string(&trace).unwrap();
        let restored: EvaluationTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, trace);
    }
}

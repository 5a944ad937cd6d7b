// Shared setup for agent-guard commands: where the project is, which policy
// applies, and the engine compiled from it.

pub mod check;
pub mod hook;
pub mod policy;
pub mod resolve;

use std::path::{Path, PathBuf};

use guard_policy::{GuardEngine, PolicyConfig, PolicyError};

/// Project-relative location of the policy file.
pub const POLICY_FILE: &str = ".claude/agent-guard.yaml";

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GuardOptions {
    pub policy: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
}

impl GuardOptions {
    /// Project root: the `--project-root` flag, then the hook input's `cwd`,
    /// then the current directory.
    pub fn project_root(&self, hook_cwd: Option<&Path>) -> Option<PathBuf> {
        self.project_root
            .clone()
            .or_else(|| hook_cwd.map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
    }

    /// The policy in effect. Never fails: unreadable files fall back to the
    /// built-in policy.
    pub fn load_policy(&self, project_root: Option<&Path>) -> PolicyConfig {
        match (&self.policy, project_root) {
            (Some(path), _) => {
                if !path.exists() {
                    tracing::warn!(
                        "policy file {} not found; using built-in policy",
                        path.display()
                    );
                }
                PolicyConfig::load_or_default(path)
            }
            (None, Some(root)) => PolicyConfig::load_or_default(&root.join(POLICY_FILE)),
            (None, None) => PolicyConfig::default(),
        }
    }

    /// Compile the policy in effect.
    pub fn engine(&self, project_root: Option<&Path>) -> Result<GuardEngine, PolicyError> {
        GuardEngine::with_user_home(self.load_policy(project_root))
    }
}

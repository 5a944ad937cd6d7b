//! # agent-guard
//!
//! PreToolUse hook that enforces orchestrator mode and sub-agent routing.
//!
//! Run with no subcommand (or `hook`) it reads one tool call from stdin and
//! writes one verdict to stdout:
//! - `agent-guard` / `agent-guard hook` — hook mode
//! - `agent-guard check-path` / `check-command` — evaluate by hand
//! - `agent-guard resolve` — show which role issued a tool call
//! - `agent-guard policy` — print the effective policy
//!
//! Typically registered in `.claude/settings.json`:
//! ```json
//! {
//!   "hooks": {
//!     "PreToolUse": [
//!       { "matcher": "Edit|Write|MultiEdit|NotebookEdit|Bash",
//!         "hooks": [{ "type": "command", "command": "agent-guard" }] }
//!     ]
//!   }
//! }
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::GuardOptions;

/// Environment variable holding the log filter (e.g. `agent_guard=debug`).
const LOG_ENV: &str = "AGENT_GUARD_LOG";

/// Keep the orchestrator delegating and block destructive git/gh commands.
#[derive(Parser)]
#[command(name = "agent-guard", version, about)]
struct Cli {
    /// Policy file (YAML). Defaults to `<project root>/.claude/agent-guard.yaml`
    /// when present, otherwise the built-in policy.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Project root. Defaults to the hook input's `cwd`, then the current directory.
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a PreToolUse payload from stdin and print the verdict.
    Hook,
    /// Check whether a role may edit a path.
    CheckPath {
        /// Role name; `main` is the orchestrator, `agent:<id>` an unresolved sub-agent.
        #[arg(long, default_value = "main")]
        role: String,
        /// File path to check.
        path: String,
        /// Print the full evaluation trace instead of the verdict.
        #[arg(long)]
        explain: bool,
    },
    /// Check a shell command against the destructive command list.
    CheckCommand {
        /// The command line, quoted as one argument.
        command: String,
        /// Print the full evaluation trace instead of the verdict.
        #[arg(long)]
        explain: bool,
    },
    /// Show which role issued a tool call.
    Resolve {
        /// Session transcript (JSONL).
        #[arg(long)]
        transcript: PathBuf,
        /// The tool call id (`tool_use_id`).
        tool_use_id: String,
    },
    /// Print the effective policy as YAML.
    Policy,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with the verdict on stdout.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();

    let cli = Cli::parse();
    let options = GuardOptions {
        policy: cli.policy,
        project_root: cli.project_root,
    };

    match cli.command.unwrap_or(Commands::Hook) {
        Commands::Hook => commands::hook::execute(&options),
        Commands::CheckPath {
            role,
            path,
            explain,
        } => commands::check::path(&options, &role, &path, explain),
        Commands::CheckCommand { command, explain } => {
            commands::check::command(&options, &command, explain)
        }
        Commands::Resolve {
            transcript,
            tool_use_id,
        } => commands::resolve::execute(&transcript, &tool_use_id),
        Commands::Policy => commands::policy::execute(&options),
    }
}

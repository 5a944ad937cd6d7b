// check.rs — `agent-guard check-path` and `check-command`.
//
// Evaluate a request typed on the command line instead of read from a hook
// payload. With `--explain` the full evaluation trace is printed.

use guard_policy::{GuardEngine, GuardRequest, Role};

use super::GuardOptions;

/// Check whether `role` may edit `path`.
pub fn path(options: &GuardOptions, role: &str, path: &str, explain: bool) -> anyhow::Result<()> {
    let project_root = options.project_root(None);
    let engine = options.engine(project_root.as_deref())?;

    let mut request = GuardRequest::file_edit(path);
    request.project_root = project_root;

    print_outcome(&engine, &request, &Role::from_name(role), explain)
}

/// Check a shell command. Commands are guarded for every role alike.
pub fn command(options: &GuardOptions, command: &str, explain: bool) -> anyhow::Result<()> {
    let engine = options.engine(options.project_root(None).as_deref())?;
    let request = GuardRequest::shell(command);

    print_outcome(&engine, &request, &Role::Orchestrator, explain)
}

fn print_outcome(
    engine: &GuardEngine,
    request: &GuardRequest,
    role: &Role,
    explain: bool,
) -> anyhow::Result<()> {
    let trace = engine.evaluate_with_trace(request, role);
    if explain {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else {
        println!("{}", trace.decision.to_json());
    }
    Ok(())
}

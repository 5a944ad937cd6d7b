// hook.rs — `agent-guard hook`: one payload in, one verdict out.
//
// Nothing in here may stop the verdict from being printed. Unreadable
// input, a broken policy file, or an unresolvable caller each have a
// fallback, and only a failed write to stdout surfaces as an error.

use std::io::{Read, Write};

use guard_policy::{ActionKind, GuardRequest, HookInput, Role, Verdict};
use guard_transcript::{resolve_or_default, TranscriptResolver};

use super::GuardOptions;

/// Read the payload from stdin and print the verdict to stdout.
pub fn execute(options: &GuardOptions) -> anyhow::Result<()> {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        tracing::warn!("failed to read hook input: {}", e);
        raw.clear();
    }

    let verdict = evaluate(&raw, options);

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", verdict.to_json())?;
    stdout.flush()?;
    Ok(())
}

/// Evaluate one raw hook payload.
pub fn evaluate(raw: &str, options: &GuardOptions) -> Verdict {
    let input = HookInput::parse(raw);
    let mut request = GuardRequest::from_hook_input(&input);

    let project_root = options.project_root(request.project_root.as_deref());
    request.project_root = project_root.clone();

    let engine = match options.engine(project_root.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("cannot compile policy, allowing: {}", e);
            return Verdict::Allow;
        }
    };

    let role = resolve_caller(&request);
    engine.evaluate(&request, &role)
}

/// Only file edits depend on who is asking; skip the transcript scan otherwise.
fn resolve_caller(request: &GuardRequest) -> Role {
    if request.action != ActionKind::FileEdit {
        return Role::Orchestrator;
    }
    match TranscriptResolver::new() {
        Ok(resolver) => resolve_or_default(
            &resolver,
            &request.call_id,
            request.transcript_path.as_deref(),
        ),
        Err(e) => {
            tracing::warn!("caller resolution unavailable: {}", e);
            Role::Orchestrator
        }
    }
}

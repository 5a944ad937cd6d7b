// resolve.rs — `agent-guard resolve`: which role issued a tool call.

use std::path::Path;

use guard_policy::Role;
use guard_transcript::{CallerResolver, TranscriptResolver};

/// Print the resolved role. When resolution fails the hook would treat the
/// caller as the orchestrator; the reason is shown alongside.
pub fn execute(transcript: &Path, tool_use_id: &str) -> anyhow::Result<()> {
    let resolver = TranscriptResolver::new()?;
    match resolver.resolve(tool_use_id, Some(transcript)) {
        Ok(role) => println!("{}", role),
        Err(e) => println!("{} ({})", Role::Orchestrator, e),
    }
    Ok(())
}

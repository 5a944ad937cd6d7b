// policy.rs — `agent-guard policy`: print the policy in effect.

use super::GuardOptions;

pub fn execute(options: &GuardOptions) -> anyhow::Result<()> {
    let policy = options.load_policy(options.project_root(None).as_deref());
    print!("{}", serde_yaml::to_string(&policy)?);
    Ok(())
}

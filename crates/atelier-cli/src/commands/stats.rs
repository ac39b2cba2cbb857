//! `atelier stats` — the acting user's workshop statistics.

use super::{failure, print_json, to_json, Context};

pub async fn show(ctx: &Context) -> Result<(), String> {
    ctx.require_user()?;
    let orchestrator = ctx.orchestrator();
    let stats = orchestrator
        .fetch_user_stats()
        .await
        .ok_or_else(|| failure(&orchestrator))?;
    print_json(&to_json(&stats)?);
    Ok(())
}

//! `atelier enrollments` — the acting user's enrollments.

use atelier_core::models::EnrollmentStatus;
use serde_json::json;

use super::{print_json, to_json, Context};

pub async fn list(ctx: &Context, status: Option<&str>) -> Result<(), String> {
    let uid = ctx.require_user()?;
    let status = status.map(str::parse::<EnrollmentStatus>).transpose()?;
    let enrollments = ctx
        .api
        .list_user_enrollments(uid, status)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&json!({
        "count": enrollments.len(),
        "enrollments": to_json(&enrollments)?,
    }));
    Ok(())
}

//! `atelier workshop` — browse, enroll in, and manage workshops.

use atelier_core::models::{NewWorkshop, WorkshopCategory, WorkshopFilters, WorkshopStatus};
use serde_json::json;

use super::{failure, print_json, to_json, Context};

/// Listing options as given on the command line.
#[derive(Debug, Default)]
pub struct ListOptions {
    pub status: Option<String>,
    pub category: Option<String>,
    pub creator: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListOptions {
    pub fn into_filters(self) -> Result<WorkshopFilters, String> {
        let status = match self.status.as_deref() {
            Some(s) => Some(s.parse::<WorkshopStatus>()?),
            None => None,
        };
        let category = match self.category.as_deref() {
            Some(c) => Some(c.parse::<WorkshopCategory>()?),
            None => None,
        };
        Ok(WorkshopFilters {
            status,
            category,
            creator_id: self.creator,
            search: self.search,
            page: self.page,
            limit: self.limit,
        })
    }
}

pub async fn list(ctx: &Context, options: ListOptions) -> Result<(), String> {
    ctx.require_user()?;
    let filters = options.into_filters()?;
    let orchestrator = ctx.orchestrator();
    if !orchestrator.fetch_workshops(filters).await {
        return Err(failure(&orchestrator));
    }
    let state = orchestrator.snapshot();
    print_json(&json!({
        "workshops": to_json(&state.workshops)?,
        "page": state.page,
        "hasMore": state.has_more,
    }));
    Ok(())
}

pub async fn get(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    print_json(&detail(ctx, workshop_id).await?);
    Ok(())
}

/// Detail view plus the computed display status and schedule strings.
pub async fn detail(ctx: &Context, workshop_id: &str) -> Result<serde_json::Value, String> {
    let orchestrator = ctx.orchestrator();
    let workshop = orchestrator
        .fetch_workshop(workshop_id)
        .await
        .ok_or_else(|| failure(&orchestrator))?;
    // `canEnroll` depends on the user's own enrollments.
    if ctx.user.is_some() && !orchestrator.fetch_user_enrollments().await {
        return Err(failure(&orchestrator));
    }
    Ok(json!({
        "workshop": to_json(&workshop)?,
        "displayStatus": orchestrator.workshop_status(&workshop).to_string(),
        "schedule": {
            "date": orchestrator.format_workshop_date(&workshop),
            "time": orchestrator.format_workshop_time(&workshop),
        },
        "canEnroll": orchestrator.can_enroll(&workshop),
    }))
}

pub async fn participants(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let uid = ctx.require_user()?;
    let participants = ctx
        .api
        .list_participants(workshop_id, uid)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&json!({ "participants": to_json(&participants)? }));
    Ok(())
}

pub async fn stats(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    let stats = orchestrator
        .fetch_workshop_stats(workshop_id)
        .await
        .ok_or_else(|| failure(&orchestrator))?;
    print_json(&to_json(&stats)?);
    Ok(())
}

pub async fn enroll(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.enroll_in_workshop(workshop_id).await {
        return Err(failure(&orchestrator));
    }
    let state = orchestrator.snapshot();
    let enrollment = state
        .enrollments()
        .iter()
        .find(|e| e.workshop_id == workshop_id)
        .cloned();
    print_json(&json!({
        "workshopId": workshop_id,
        "enrolled": orchestrator.is_enrolled(workshop_id),
        "enrollment": to_json(&enrollment)?,
    }));
    Ok(())
}

pub async fn unenroll(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.unenroll_from_workshop(workshop_id).await {
        return Err(failure(&orchestrator));
    }
    print_json(&json!({ "workshopId": workshop_id, "enrolled": false }));
    Ok(())
}

pub async fn status(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let uid = ctx.require_user()?;
    let lookup = ctx
        .api
        .enrollment_status(workshop_id, uid)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&to_json(&lookup)?);
    Ok(())
}

pub async fn create(ctx: &Context, draft: NewWorkshop) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    let workshop = orchestrator
        .create_workshop(draft)
        .await
        .ok_or_else(|| failure(&orchestrator))?;
    print_json(&to_json(&workshop)?);
    Ok(())
}

pub async fn publish(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.publish_workshop(workshop_id).await {
        return Err(failure(&orchestrator));
    }
    print_json(&json!({ "workshopId": workshop_id, "status": WorkshopStatus::Published.as_str() }));
    Ok(())
}

pub async fn cancel(ctx: &Context, workshop_id: &str, reason: Option<&str>) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.cancel_workshop(workshop_id, reason).await {
        return Err(failure(&orchestrator));
    }
    print_json(&json!({
        "workshopId": workshop_id,
        "status": WorkshopStatus::Cancelled.as_str(),
        "reason": reason,
    }));
    Ok(())
}

pub async fn complete(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.mark_workshop_completed(workshop_id).await {
        return Err(failure(&orchestrator));
    }
    print_json(&json!({ "workshopId": workshop_id, "status": WorkshopStatus::Completed.as_str() }));
    Ok(())
}

pub async fn delete(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    if !orchestrator.delete_workshop(workshop_id).await {
        return Err(failure(&orchestrator));
    }
    print_json(&json!({ "workshopId": workshop_id, "deleted": true }));
    Ok(())
}

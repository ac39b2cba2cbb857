//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command. Reads go straight
//! through the access layer; mutations run through a `WorkshopOrchestrator`
//! so the CLI gets the same guards and error messages as any other view.

pub mod certificate;
pub mod enrollment;
pub mod stats;
pub mod workshop;

use std::sync::Arc;

use atelier_core::api::WorkshopApi;
use atelier_core::{
    ClientConfig, HttpWorkshopApi, SessionUser, SharedSession, WorkshopOrchestrator,
};
use serde::Serialize;

/// What every command needs: the access layer and the acting user.
pub struct Context {
    pub api: Arc<dyn WorkshopApi>,
    pub user: Option<SessionUser>,
}

impl Context {
    /// Context against `api_url`; the request timeout still comes from the environment.
    pub fn new(api_url: &str, user_id: Option<&str>) -> Self {
        let config = ClientConfig::from_env().with_base_url(api_url);
        tracing::debug!("[CLI] using backend {}", config.base_url);
        Self::with_api(Arc::new(HttpWorkshopApi::new(&config)), user_id)
    }

    pub fn with_api(api: Arc<dyn WorkshopApi>, user_id: Option<&str>) -> Self {
        let user = user_id
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(|uid| SessionUser::new(uid, uid));
        Self { api, user }
    }

    pub fn require_user(&self) -> Result<&str, String> {
        self.user
            .as_ref()
            .map(|u| u.uid.as_str())
            .ok_or_else(|| "No user given. Pass --user or set ATELIER_USER_ID.".to_string())
    }

    /// A fresh orchestrator acting as `self.user`.
    pub fn orchestrator(&self) -> WorkshopOrchestrator {
        let session = match &self.user {
            Some(user) => SharedSession::signed_in(user.clone()),
            None => SharedSession::new(),
        };
        WorkshopOrchestrator::new(self.api.clone(), Arc::new(session))
    }
}

/// The message an orchestrator action left in its error slot.
pub(crate) fn failure(orchestrator: &WorkshopOrchestrator) -> String {
    let state = orchestrator.snapshot();
    state
        .error
        .or(state.enrollment_error)
        .unwrap_or_else(|| "Operation failed".to_string())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Failed to serialize output: {}", e))
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

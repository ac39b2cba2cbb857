//! Workshop State Orchestrator — the session's single owner of workshop state.
//!
//! Every mutating action runs the same sequence:
//!
//! 1. Guard on identity; fail fast with a local error when signed out
//! 2. Raise the family's loading flag and clear its error
//! 3. Call the access layer
//! 4. On success, patch the in-memory collections instead of refetching;
//!    on failure, write the message into the error slot and leave state alone
//!
//! Errors never escape: actions resolve to `bool` / `Option<T>` and the
//! message is in `WorkshopState::error` or `WorkshopState::enrollment_error`.
//! Loading flags are lowered by a drop guard, so no exit path leaves them set.
//!
//! Two mutating actions on the same workshop may not overlap; the second one
//! fails with `ClientError::OperationInProgress`. `shutdown()` (also run on
//! drop) aborts every in-flight request; aborted actions leave state as is.

pub mod derived;
pub mod state;

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::WorkshopApi;
use crate::error::{ClientError, Result};
use crate::models::{
    EnrollmentStatus, NewWorkshop, UserWorkshopStats, Workshop, WorkshopCertificate,
    WorkshopFilters, WorkshopPatch, WorkshopStats, WorkshopStatus,
};
use crate::session::{IdentityProvider, SessionUser};

pub use derived::DisplayStatus;
pub use state::{OperationFamily, WorkshopState};

use self::state::OperationFamily::{Enrollment, General};

pub struct WorkshopOrchestrator {
    api: Arc<dyn WorkshopApi>,
    identity: Arc<dyn IdentityProvider>,
    state: watch::Sender<WorkshopState>,
    in_flight: Mutex<HashSet<String>>,
    shutdown: CancellationToken,
}

/// Lowers the loading flag of `family` when dropped.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<WorkshopState>,
    family: OperationFamily,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<WorkshopState>, family: OperationFamily) -> Self {
        state.send_modify(|s| s.begin(family));
        Self { state, family }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let family = self.family;
        self.state.send_modify(|s| s.finish(family));
    }
}

/// Holds a workshop id in the in-flight set until dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    workshop_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.workshop_id);
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl WorkshopOrchestrator {
    pub fn new(api: Arc<dyn WorkshopApi>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(WorkshopState::default());
        Self {
            api,
            identity,
            state,
            in_flight: Mutex::new(HashSet::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn api(&self) -> &Arc<dyn WorkshopApi> {
        &self.api
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<WorkshopState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> WorkshopState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.identity.current_user()
    }

    pub fn clear_errors(&self) {
        self.state.send_modify(|s| s.clear_errors());
    }

    /// Abort every outstanding request. Later actions resolve as cancelled.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("[Orchestrator] shutting down, aborting in-flight requests");
            self.shutdown.cancel();
        }
    }

    // ── plumbing ────────────────────────────────────────────────────────

    /// Run an access-layer call, abandoning it on shutdown.
    async fn call<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        }
    }

    fn require_user(&self, action: &str, family: OperationFamily) -> Option<SessionUser> {
        let user = self.identity.current_user();
        if user.is_none() {
            self.fail(family, ClientError::NotAuthenticated(action.to_string()));
        }
        user
    }

    fn claim(&self, workshop_id: &str) -> Result<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(workshop_id.to_string()) {
            return Err(ClientError::OperationInProgress(workshop_id.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            workshop_id: workshop_id.to_string(),
        })
    }

    fn fail(&self, family: OperationFamily, error: ClientError) {
        if matches!(error, ClientError::Cancelled) {
            tracing::debug!("[Orchestrator] request cancelled");
            return;
        }
        tracing::warn!("[Orchestrator] {:?} operation failed: {}", family, error);
        let message = error.to_string();
        self.state.send_modify(|s| s.set_error(family, message));
    }

    /// Refresh `user_enrollments` as part of an action that already succeeded.
    async fn reload_enrollments(&self, uid: &str) {
        match self.call(self.api.list_user_enrollments(uid, None)).await {
            Ok(enrollments) => self
                .state
                .send_modify(|s| s.user_enrollments = Some(enrollments)),
            Err(e) => tracing::warn!("[Orchestrator] could not reload enrollments: {}", e),
        }
    }

    // ── reads ───────────────────────────────────────────────────────────

    /// Load the first page (or `filters.page`) of available workshops.
    pub async fn fetch_workshops(&self, filters: WorkshopFilters) -> bool {
        let Some(user) = self.require_user("browse workshops", General) else {
            return false;
        };
        let _loading = LoadingGuard::begin(&self.state, General);
        let page = filters.page.unwrap_or(1);
        let request = filters.with_page(page);

        match self.call(self.api.list_available(&user.uid, &request)).await {
            Ok(result) => {
                let has_more = more_pages(&result.workshops, result.has_more, filters.limit);
                let workshops = keep_status(result.workshops, filters.status.as_ref());
                tracing::debug!("[Orchestrator] loaded {} workshops", workshops.len());
                self.state.send_modify(|s| {
                    s.workshops = workshops;
                    s.filters = filters;
                    s.page = page;
                    s.has_more = has_more;
                });
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    /// Fetch the next page with the active filters and append it.
    pub async fn load_more_workshops(&self) -> bool {
        let (filters, next_page, has_more) = {
            let s = self.state.borrow();
            (s.filters.clone(), s.page.max(1) + 1, s.has_more)
        };
        if !has_more {
            return false;
        }
        let Some(user) = self.require_user("browse workshops", General) else {
            return false;
        };
        let _loading = LoadingGuard::begin(&self.state, General);
        let request = filters.with_page(next_page);

        match self.call(self.api.list_available(&user.uid, &request)).await {
            Ok(result) => {
                let has_more = more_pages_after(&result.workshops, result.has_more, filters.limit);
                let workshops = keep_status(result.workshops, filters.status.as_ref());
                self.state.send_modify(|s| {
                    s.append_workshops(workshops);
                    s.page = next_page;
                    s.has_more = has_more;
                });
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    /// Load one workshop (detail shape) into `current_workshop`.
    pub async fn fetch_workshop(&self, workshop_id: &str) -> Option<Workshop> {
        let _loading = LoadingGuard::begin(&self.state, General);
        match self.call(self.api.get_workshop_detail(workshop_id)).await {
            Ok(workshop) => {
                let copy = workshop.clone();
                self.state.send_modify(|s| {
                    s.replace_workshop(&copy);
                    s.current_workshop = Some(copy);
                });
                Some(workshop)
            }
            Err(e) => {
                self.fail(General, e);
                None
            }
        }
    }

    pub async fn fetch_user_created_workshops(&self) -> bool {
        let Some(user) = self.require_user("view your workshops", General) else {
            return false;
        };
        let _loading = LoadingGuard::begin(&self.state, General);
        match self.call(self.api.list_created(&user.uid)).await {
            Ok(workshops) => {
                self.state
                    .send_modify(|s| s.user_created_workshops = workshops);
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    pub async fn fetch_user_enrollments(&self) -> bool {
        let Some(user) = self.require_user("view your enrollments", Enrollment) else {
            return false;
        };
        let _loading = LoadingGuard::begin(&self.state, Enrollment);
        match self.call(self.api.list_user_enrollments(&user.uid, None)).await {
            Ok(enrollments) => {
                self.state
                    .send_modify(|s| s.user_enrollments = Some(enrollments));
                true
            }
            Err(e) => {
                self.fail(Enrollment, e);
                false
            }
        }
    }

    pub async fn fetch_user_certificates(&self) -> bool {
        let Some(user) = self.require_user("view your certificates", General) else {
            return false;
        };
        let _loading = LoadingGuard::begin(&self.state, General);
        match self.call(self.api.list_user_certificates(&user.uid)).await {
            Ok(certificates) => {
                self.state
                    .send_modify(|s| s.user_certificates = certificates);
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    pub async fn fetch_workshop_stats(&self, workshop_id: &str) -> Option<WorkshopStats> {
        let _loading = LoadingGuard::begin(&self.state, General);
        match self.call(self.api.workshop_stats(workshop_id)).await {
            Ok(stats) => {
                let copy = stats.clone();
                self.state.send_modify(|s| s.workshop_stats = Some(copy));
                Some(stats)
            }
            Err(e) => {
                self.fail(General, e);
                None
            }
        }
    }

    pub async fn fetch_user_stats(&self) -> Option<UserWorkshopStats> {
        let user = self.require_user("view your statistics", General)?;
        let _loading = LoadingGuard::begin(&self.state, General);
        match self.call(self.api.user_stats(&user.uid)).await {
            Ok(stats) => {
                let copy = stats.clone();
                self.state.send_modify(|s| s.user_stats = Some(copy));
                Some(stats)
            }
            Err(e) => {
                self.fail(General, e);
                None
            }
        }
    }

    // ── creator actions ─────────────────────────────────────────────────

    pub async fn create_workshop(&self, mut draft: NewWorkshop) -> Option<Workshop> {
        let user = self.require_user("create a workshop", General)?;
        if let Err(e) = draft.validate() {
            self.fail(General, e);
            return None;
        }
        if draft.creator_name.is_none() && !user.display_name.is_empty() {
            draft.creator_name = Some(user.display_name.clone());
        }
        let _loading = LoadingGuard::begin(&self.state, General);

        match self.call(self.api.create_workshop(&user.uid, &draft)).await {
            Ok(workshop) => {
                tracing::info!(
                    "[Orchestrator] created workshop {} ({})",
                    workshop.id,
                    workshop.status
                );
                let copy = workshop.clone();
                self.state.send_modify(|s| {
                    if copy.status == WorkshopStatus::Published {
                        s.workshops.insert(0, copy.clone());
                    }
                    s.user_created_workshops.insert(0, copy);
                });
                Some(workshop)
            }
            Err(e) => {
                self.fail(General, e);
                None
            }
        }
    }

    /// Send the fields that differ between `base` and `edited`.
    ///
    /// The diff is computed against the local copy; there is no version check
    /// against the server's current document.
    pub async fn update_workshop(&self, base: &Workshop, edited: &Workshop) -> bool {
        let Some(user) = self.require_user("update a workshop", General) else {
            return false;
        };
        let patch = match WorkshopPatch::between(base, edited) {
            Ok(patch) => patch,
            Err(e) => {
                self.fail(General, e);
                return false;
            }
        };
        if patch.is_empty() {
            return true;
        }
        let _claim = match self.claim(&base.id) {
            Ok(claim) => claim,
            Err(e) => {
                self.fail(General, e);
                return false;
            }
        };
        let _loading = LoadingGuard::begin(&self.state, General);

        match self
            .call(self.api.update_workshop(&base.id, Some(&user.uid), &patch))
            .await
        {
            Ok(Some(updated)) => {
                self.state.send_modify(|s| s.replace_workshop(&updated));
                true
            }
            Ok(None) => {
                self.state.send_modify(|s| {
                    s.patch_workshop(&base.id, |w| apply_local_patch(w, &patch))
                });
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    pub async fn publish_workshop(&self, workshop_id: &str) -> bool {
        let Some(user) = self.require_user("publish a workshop", General) else {
            return false;
        };
        self.lifecycle_action(workshop_id, || {
            self.api.publish_workshop(workshop_id, &user.uid)
        }, |s, returned| {
            match returned {
                Some(w) => s.replace_workshop(w),
                None => s.set_status(workshop_id, WorkshopStatus::Published, &now_iso()),
            }
            s.list_if_missing(workshop_id);
        })
        .await
    }

    pub async fn cancel_workshop(&self, workshop_id: &str, reason: Option<&str>) -> bool {
        let Some(user) = self.require_user("cancel a workshop", General) else {
            return false;
        };
        self.lifecycle_action(workshop_id, || {
            self.api.cancel_workshop(workshop_id, &user.uid, reason)
        }, |s, returned| match returned {
            Some(w) => s.replace_workshop(w),
            None => {
                s.set_status(workshop_id, WorkshopStatus::Cancelled, &now_iso());
                let reason = reason.map(str::to_string);
                s.patch_workshop(workshop_id, |w| w.cancellation_reason = reason.clone());
            }
        })
        .await
    }

    /// Completion also settles enrollments server-side, so they are reloaded.
    pub async fn mark_workshop_completed(&self, workshop_id: &str) -> bool {
        let Some(user) = self.require_user("complete a workshop", General) else {
            return false;
        };
        let done = self
            .lifecycle_action(workshop_id, || {
                self.api.mark_workshop_completed(workshop_id, &user.uid)
            }, |s, returned| match returned {
                Some(w) => s.replace_workshop(w),
                None => s.set_status(workshop_id, WorkshopStatus::Completed, &now_iso()),
            })
            .await;
        if done {
            self.reload_enrollments(&user.uid).await;
        }
        done
    }

    pub async fn delete_workshop(&self, workshop_id: &str) -> bool {
        if self.require_user("delete a workshop", General).is_none() {
            return false;
        }
        let _claim = match self.claim(workshop_id) {
            Ok(claim) => claim,
            Err(e) => {
                self.fail(General, e);
                return false;
            }
        };
        let _loading = LoadingGuard::begin(&self.state, General);

        match self.call(self.api.delete_workshop(workshop_id)).await {
            Ok(()) => {
                tracing::info!("[Orchestrator] deleted workshop {}", workshop_id);
                self.state.send_modify(|s| s.remove_workshop(workshop_id));
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    /// Shared body of publish / cancel / complete: claim, call, reconcile.
    async fn lifecycle_action<F, Fut>(
        &self,
        workshop_id: &str,
        request: F,
        reconcile: impl FnOnce(&mut WorkshopState, Option<&Workshop>),
    ) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Workshop>>>,
    {
        let _claim = match self.claim(workshop_id) {
            Ok(claim) => claim,
            Err(e) => {
                self.fail(General, e);
                return false;
            }
        };
        let _loading = LoadingGuard::begin(&self.state, General);

        match self.call(request()).await {
            Ok(returned) => {
                self.state
                    .send_modify(|s| reconcile(s, returned.as_ref()));
                true
            }
            Err(e) => {
                self.fail(General, e);
                false
            }
        }
    }

    // ── participant actions ─────────────────────────────────────────────

    pub async fn enroll_in_workshop(&self, workshop_id: &str) -> bool {
        let Some(user) = self.require_user("enroll", Enrollment) else {
            return false;
        };
        let _claim = match self.claim(workshop_id) {
            Ok(claim) => claim,
            Err(e) => {
                self.fail(Enrollment, e);
                return false;
            }
        };
        let _loading = LoadingGuard::begin(&self.state, Enrollment);

        match self.call(self.api.enroll(workshop_id, &user.uid)).await {
            Ok(enrollment) => {
                let waitlisted = enrollment
                    .as_ref()
                    .is_some_and(|e| e.status == EnrollmentStatus::Waitlisted);
                tracing::info!(
                    "[Orchestrator] {} enrolled in {}{}",
                    user.uid,
                    workshop_id,
                    if waitlisted { " (waitlisted)" } else { "" }
                );
                self.state
                    .send_modify(|s| s.record_enrollment(workshop_id, waitlisted));
                self.reload_enrollments(&user.uid).await;
                true
            }
            Err(e) => {
                self.fail(Enrollment, e);
                false
            }
        }
    }

    pub async fn unenroll_from_workshop(&self, workshop_id: &str) -> bool {
        let Some(user) = self.require_user("unenroll", Enrollment) else {
            return false;
        };
        let _claim = match self.claim(workshop_id) {
            Ok(claim) => claim,
            Err(e) => {
                self.fail(Enrollment, e);
                return false;
            }
        };
        let _loading = LoadingGuard::begin(&self.state, Enrollment);
        let was_waitlisted = self
            .state
            .borrow()
            .enrollments()
            .iter()
            .any(|e| e.workshop_id == workshop_id && e.status == EnrollmentStatus::Waitlisted);

        match self.call(self.api.unenroll(workshop_id, &user.uid)).await {
            Ok(()) => {
                self.state
                    .send_modify(|s| s.record_unenrollment(workshop_id, was_waitlisted));
                self.reload_enrollments(&user.uid).await;
                true
            }
            Err(e) => {
                self.fail(Enrollment, e);
                false
            }
        }
    }

    pub async fn issue_certificate(&self, workshop_id: &str) -> Option<WorkshopCertificate> {
        let user = self.require_user("receive a certificate", General)?;
        let _loading = LoadingGuard::begin(&self.state, General);

        match self.call(self.api.issue_certificate(workshop_id, &user.uid)).await {
            Ok(certificate) => {
                if certificate.user_id.is_empty() || certificate.user_id == user.uid {
                    let copy = certificate.clone();
                    self.state.send_modify(|s| s.add_certificate(copy));
                }
                Some(certificate)
            }
            Err(e) => {
                self.fail(General, e);
                None
            }
        }
    }

    // ── derived queries ─────────────────────────────────────────────────

    pub fn is_enrolled(&self, workshop_id: &str) -> bool {
        derived::is_enrolled(self.state.borrow().enrollments(), workshop_id)
    }

    pub fn can_enroll(&self, workshop: &Workshop) -> bool {
        let user = self.identity.current_user();
        derived::can_enroll(
            user.as_ref(),
            workshop,
            self.state.borrow().enrollments(),
            Utc::now(),
        )
    }

    pub fn workshop_status(&self, workshop: &Workshop) -> DisplayStatus {
        derived::display_status(workshop, Utc::now())
    }

    pub fn format_workshop_date(&self, workshop: &Workshop) -> String {
        derived::format_workshop_date(workshop)
    }

    pub fn format_workshop_time(&self, workshop: &Workshop) -> String {
        derived::format_workshop_time(workshop)
    }

    pub fn enrolled_workshops(&self) -> Vec<Workshop> {
        let s = self.state.borrow();
        derived::enrolled_workshops(&s.workshops, s.enrollments())
    }

    pub fn upcoming_workshops(&self) -> Vec<Workshop> {
        let s = self.state.borrow();
        derived::upcoming_workshops(&s.workshops, s.enrollments(), Utc::now())
    }

    pub fn completed_workshops(&self) -> Vec<Workshop> {
        let s = self.state.borrow();
        derived::completed_workshops(&s.workshops, s.enrollments())
    }
}

impl Drop for WorkshopOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Apply an accepted update to a local copy; a copy the patch cannot be applied
/// to stays as it was until the next reload.
fn apply_local_patch(workshop: &mut Workshop, patch: &WorkshopPatch) {
    match patch.apply_to(workshop) {
        Ok(patched) => *workshop = patched,
        Err(e) => tracing::warn!(
            "[Orchestrator] local copy of workshop {} left stale: {}",
            workshop.id,
            e
        ),
    }
}

fn keep_status(workshops: Vec<Workshop>, status: Option<&WorkshopStatus>) -> Vec<Workshop> {
    match status {
        Some(status) => workshops.into_iter().filter(|w| &w.status == status).collect(),
        None => workshops,
    }
}

/// Trust the server's `hasMore`; otherwise a full page implies another one.
fn more_pages(page: &[Workshop], reported: Option<bool>, limit: Option<u32>) -> bool {
    reported.unwrap_or_else(|| limit.is_some_and(|limit| limit > 0 && page.len() >= limit as usize))
}

fn more_pages_after(page: &[Workshop], reported: Option<bool>, limit: Option<u32>) -> bool {
    !page.is_empty() && more_pages(page, reported, limit)
}

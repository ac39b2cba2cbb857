//! The session's working copy of workshop data, and the patches applied to it.
//!
//! Every mutation here is a map over the previous state. Increments and
//! field overwrites commute, so two in-flight actions can reconcile in
//! either order.

use crate::models::{
    UserWorkshopStats, Workshop, WorkshopCertificate, WorkshopEnrollment, WorkshopFilters,
    WorkshopStats, WorkshopStatus,
};

/// Which loading/error slot an action reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationFamily {
    General,
    Enrollment,
}

#[derive(Debug, Clone, Default)]
pub struct WorkshopState {
    pub workshops: Vec<Workshop>,
    pub current_workshop: Option<Workshop>,
    pub user_created_workshops: Vec<Workshop>,
    /// `None` until the first successful load.
    pub user_enrollments: Option<Vec<WorkshopEnrollment>>,
    pub user_certificates: Vec<WorkshopCertificate>,
    pub workshop_stats: Option<WorkshopStats>,
    pub user_stats: Option<UserWorkshopStats>,

    pub filters: WorkshopFilters,
    pub page: u32,
    pub has_more: bool,

    pub loading: bool,
    pub error: Option<String>,
    pub enrollment_loading: bool,
    pub enrollment_error: Option<String>,

    general_ops: u32,
    enrollment_ops: u32,
}

impl WorkshopState {
    pub fn enrollments(&self) -> &[WorkshopEnrollment] {
        self.user_enrollments.as_deref().unwrap_or(&[])
    }

    pub fn error_for(&self, family: OperationFamily) -> Option<&str> {
        match family {
            OperationFamily::General => self.error.as_deref(),
            OperationFamily::Enrollment => self.enrollment_error.as_deref(),
        }
    }

    pub(crate) fn begin(&mut self, family: OperationFamily) {
        match family {
            OperationFamily::General => {
                self.general_ops += 1;
                self.loading = true;
                self.error = None;
            }
            OperationFamily::Enrollment => {
                self.enrollment_ops += 1;
                self.enrollment_loading = true;
                self.enrollment_error = None;
            }
        }
    }

    pub(crate) fn finish(&mut self, family: OperationFamily) {
        match family {
            OperationFamily::General => {
                self.general_ops = self.general_ops.saturating_sub(1);
                self.loading = self.general_ops > 0;
            }
            OperationFamily::Enrollment => {
                self.enrollment_ops = self.enrollment_ops.saturating_sub(1);
                self.enrollment_loading = self.enrollment_ops > 0;
            }
        }
    }

    pub(crate) fn set_error(&mut self, family: OperationFamily, message: String) {
        match family {
            OperationFamily::General => self.error = Some(message),
            OperationFamily::Enrollment => self.enrollment_error = Some(message),
        }
    }

    pub(crate) fn clear_errors(&mut self) {
        self.error = None;
        self.enrollment_error = None;
    }

    /// Apply `patch` to every held copy of workshop `id`.
    pub(crate) fn patch_workshop(&mut self, id: &str, mut patch: impl FnMut(&mut Workshop)) {
        for workshop in self
            .workshops
            .iter_mut()
            .chain(self.user_created_workshops.iter_mut())
            .chain(self.current_workshop.iter_mut())
            .filter(|w| w.id == id)
        {
            patch(workshop);
        }
    }

    /// Overwrite every held copy with the server's version.
    pub(crate) fn replace_workshop(&mut self, updated: &Workshop) {
        self.patch_workshop(&updated.id, |w| *w = updated.clone());
    }

    /// A seat was taken (`waitlisted == false`) or a waitlist spot was added.
    pub(crate) fn record_enrollment(&mut self, id: &str, waitlisted: bool) {
        self.patch_workshop(id, |w| {
            if waitlisted {
                w.waitlist_count += 1;
            } else {
                w.current_enrollments += 1;
            }
        });
    }

    pub(crate) fn record_unenrollment(&mut self, id: &str, waitlisted: bool) {
        self.patch_workshop(id, |w| {
            if waitlisted {
                w.waitlist_count = w.waitlist_count.saturating_sub(1);
            } else {
                w.current_enrollments = w.current_enrollments.saturating_sub(1);
            }
        });
    }

    pub(crate) fn set_status(&mut self, id: &str, status: WorkshopStatus, at: &str) {
        self.patch_workshop(id, |w| {
            w.status = status.clone();
            w.updated_at = Some(at.to_string());
            match status {
                WorkshopStatus::Published => w.published_at = Some(at.to_string()),
                WorkshopStatus::Completed => w.completed_at = Some(at.to_string()),
                _ => {}
            }
        });
    }

    /// Make sure a freshly published workshop shows up in the listing.
    pub(crate) fn list_if_missing(&mut self, id: &str) {
        if self.workshops.iter().any(|w| w.id == id) {
            return;
        }
        let copy = self
            .user_created_workshops
            .iter()
            .chain(self.current_workshop.iter())
            .find(|w| w.id == id)
            .cloned();
        if let Some(copy) = copy {
            self.workshops.insert(0, copy);
        }
    }

    pub(crate) fn remove_workshop(&mut self, id: &str) {
        self.workshops.retain(|w| w.id != id);
        self.user_created_workshops.retain(|w| w.id != id);
        if self.current_workshop.as_ref().is_some_and(|w| w.id == id) {
            self.current_workshop = None;
        }
        if let Some(enrollments) = self.user_enrollments.as_mut() {
            enrollments.retain(|e| e.workshop_id != id);
        }
    }

    /// Append a page, skipping workshops already listed.
    pub(crate) fn append_workshops(&mut self, page: Vec<Workshop>) {
        for workshop in page {
            if !self.workshops.iter().any(|w| w.id == workshop.id) {
                self.workshops.push(workshop);
            }
        }
    }

    pub(crate) fn add_certificate(&mut self, certificate: WorkshopCertificate) {
        if let Some(enrollments) = self.user_enrollments.as_mut() {
            for enrollment in enrollments
                .iter_mut()
                .filter(|e| e.workshop_id == certificate.workshop_id)
            {
                enrollment.certificate_issued = true;
                enrollment.certificate_id = Some(certificate.id.clone());
            }
        }
        self.user_certificates.retain(|c| c.id != certificate.id);
        self.user_certificates.insert(0, certificate);
    }
}

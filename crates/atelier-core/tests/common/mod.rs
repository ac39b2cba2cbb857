//! In-memory `WorkshopApi` used by the orchestrator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::api::WorkshopApi;
use atelier_core::models::{
    CertificateVerification, EnrollmentLookup, EnrollmentStatus, NewWorkshop, Participant,
    ShareLink, UserWorkshopStats, Workshop, WorkshopCertificate, WorkshopEnrollment,
    WorkshopFilters, WorkshopPage, WorkshopPatch, WorkshopStats, WorkshopStatus,
};
use atelier_core::orchestrator::WorkshopOrchestrator;
use atelier_core::session::{SessionUser, SharedSession};
use atelier_core::{ClientError, Result};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use tokio::sync::Mutex;

pub struct FakeWorkshopApi {
    pub workshops: Mutex<Vec<Workshop>>,
    pub enrollments: Mutex<Vec<WorkshopEnrollment>>,
    pub certificates: Mutex<Vec<WorkshopCertificate>>,
    pub patches: Mutex<Vec<WorkshopPatch>>,
    pub calls: Mutex<Vec<String>>,
    pub enroll_calls: AtomicUsize,
    /// Every call fails with this status while set.
    pub fail_status: Mutex<Option<StatusCode>>,
    /// Added latency for every call.
    pub delay: Option<Duration>,
    pub page_size: usize,
}

impl Default for FakeWorkshopApi {
    fn default() -> Self {
        Self {
            workshops: Mutex::new(Vec::new()),
            enrollments: Mutex::new(Vec::new()),
            certificates: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            enroll_calls: AtomicUsize::new(0),
            fail_status: Mutex::new(None),
            delay: None,
            page_size: 2,
        }
    }
}

impl FakeWorkshopApi {
    pub fn with_workshops(workshops: Vec<Workshop>) -> Self {
        Self {
            workshops: Mutex::new(workshops),
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: &str, action: &str) -> Result<()> {
        self.calls.lock().await.push(call.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match *self.fail_status.lock().await {
            Some(status) => Err(ClientError::http(action, status, None)),
            None => Ok(()),
        }
    }

    async fn find(&self, workshop_id: &str) -> Option<Workshop> {
        self.workshops
            .lock()
            .await
            .iter()
            .find(|w| w.id == workshop_id)
            .cloned()
    }

    async fn set_status(&self, workshop_id: &str, status: WorkshopStatus) -> Option<Workshop> {
        let mut workshops = self.workshops.lock().await;
        let workshop = workshops.iter_mut().find(|w| w.id == workshop_id)?;
        workshop.status = status;
        Some(workshop.clone())
    }
}

/// A published workshop a week from now.
pub fn upcoming_workshop(id: &str, creator: &str) -> Workshop {
    let day = (Utc::now() + ChronoDuration::days(7)).date_naive();
    Workshop {
        id: id.to_string(),
        title: format!("Workshop {}", id),
        creator_id: creator.to_string(),
        creator_name: "Creator".to_string(),
        status: WorkshopStatus::Published,
        date: day.format("%Y-%m-%d").to_string(),
        start_time: "10:00".to_string(),
        end_time: "12:00".to_string(),
        max_participants: 20,
        current_enrollments: 0,
        ..Default::default()
    }
}

pub fn orchestrator_for(api: Arc<FakeWorkshopApi>, uid: Option<&str>) -> WorkshopOrchestrator {
    let session = match uid {
        Some(uid) => SharedSession::signed_in(SessionUser::new(uid, format!("User {}", uid))),
        None => SharedSession::new(),
    };
    WorkshopOrchestrator::new(api, Arc::new(session))
}

#[async_trait]
impl WorkshopApi for FakeWorkshopApi {
    async fn list_available(&self, uid: &str, filters: &WorkshopFilters) -> Result<WorkshopPage> {
        self.enter(&format!("list_available:{}", uid), "fetch workshops")
            .await?;
        let page = filters.page.unwrap_or(1).max(1) as usize;
        let workshops = self.workshops.lock().await;
        let published: Vec<Workshop> = workshops
            .iter()
            .filter(|w| w.status == WorkshopStatus::Published)
            .cloned()
            .collect();
        let start = (page - 1) * self.page_size;
        let items: Vec<Workshop> = published
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(WorkshopPage {
            has_more: Some(start + items.len() < published.len()),
            total: Some(published.len() as u64),
            page: Some(page as u32),
            workshops: items,
        })
    }

    async fn get_workshop(&self, workshop_id: &str) -> Result<Workshop> {
        self.get_workshop_detail(workshop_id).await
    }

    async fn get_workshop_detail(&self, workshop_id: &str) -> Result<Workshop> {
        self.enter(&format!("get:{}", workshop_id), "fetch workshop details")
            .await?;
        self.find(workshop_id)
            .await
            .ok_or_else(|| ClientError::http("fetch workshop details", StatusCode::NOT_FOUND, None))
    }

    async fn list_participants(&self, workshop_id: &str, _uid: &str) -> Result<Vec<Participant>> {
        self.enter(&format!("participants:{}", workshop_id), "fetch participants")
            .await?;
        Ok(Vec::new())
    }

    async fn create_workshop(&self, uid: &str, draft: &NewWorkshop) -> Result<Workshop> {
        self.enter(&format!("create:{}", uid), "create workshop").await?;
        let mut workshops = self.workshops.lock().await;
        let workshop = Workshop {
            id: format!("w{}", workshops.len() + 100),
            title: draft.title.clone(),
            creator_id: uid.to_string(),
            creator_name: draft.creator_name.clone().unwrap_or_default(),
            date: draft.date.clone(),
            start_time: draft.start_time.clone(),
            end_time: draft.end_time.clone(),
            max_participants: draft.max_participants,
            status: WorkshopStatus::Draft,
            ..Default::default()
        };
        workshops.push(workshop.clone());
        Ok(workshop)
    }

    async fn list_created(&self, user_id: &str) -> Result<Vec<Workshop>> {
        self.enter(&format!("created:{}", user_id), "fetch created workshops")
            .await?;
        Ok(self
            .workshops
            .lock()
            .await
            .iter()
            .filter(|w| w.creator_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_workshop(
        &self,
        workshop_id: &str,
        _uid: Option<&str>,
        patch: &WorkshopPatch,
    ) -> Result<Option<Workshop>> {
        self.enter(&format!("update:{}", workshop_id), "update workshop")
            .await?;
        self.patches.lock().await.push(patch.clone());
        // Acknowledge without echoing, like the backend's update route.
        Ok(None)
    }

    async fn publish_workshop(&self, workshop_id: &str, _uid: &str) -> Result<Option<Workshop>> {
        self.enter(&format!("publish:{}", workshop_id), "publish workshop")
            .await?;
        Ok(self.set_status(workshop_id, WorkshopStatus::Published).await)
    }

    async fn delete_workshop(&self, workshop_id: &str) -> Result<()> {
        self.enter(&format!("delete:{}", workshop_id), "delete workshop")
            .await?;
        self.workshops.lock().await.retain(|w| w.id != workshop_id);
        Ok(())
    }

    async fn enroll(&self, workshop_id: &str, user_id: &str) -> Result<Option<WorkshopEnrollment>> {
        self.enroll_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(&format!("enroll:{}:{}", workshop_id, user_id), "enroll in workshop")
            .await?;
        let mut enrollments = self.enrollments.lock().await;
        if enrollments.iter().any(|e| {
            e.workshop_id == workshop_id
                && e.user_id == user_id
                && e.status != EnrollmentStatus::Cancelled
        }) {
            return Err(ClientError::AlreadyEnrolled);
        }

        let mut workshops = self.workshops.lock().await;
        let workshop = workshops
            .iter_mut()
            .find(|w| w.id == workshop_id)
            .ok_or_else(|| ClientError::http("enroll in workshop", StatusCode::NOT_FOUND, None))?;
        let status = if workshop.is_full() && workshop.allow_waitlist {
            workshop.waitlist_count += 1;
            EnrollmentStatus::Waitlisted
        } else {
            workshop.current_enrollments += 1;
            EnrollmentStatus::Enrolled
        };
        let enrollment = WorkshopEnrollment {
            id: format!("e{}", enrollments.len() + 1),
            workshop_id: workshop_id.to_string(),
            user_id: user_id.to_string(),
            workshop_title: workshop.title.clone(),
            status,
            ..Default::default()
        };
        enrollments.push(enrollment.clone());
        Ok(Some(enrollment))
    }

    async fn unenroll(&self, workshop_id: &str, user_id: &str) -> Result<()> {
        self.enter(&format!("unenroll:{}:{}", workshop_id, user_id), "unenroll from workshop")
            .await?;
        for e in self.enrollments.lock().await.iter_mut() {
            if e.workshop_id == workshop_id && e.user_id == user_id {
                e.status = EnrollmentStatus::Cancelled;
            }
        }
        Ok(())
    }

    async fn list_workshop_enrollments(&self, workshop_id: &str) -> Result<Vec<WorkshopEnrollment>> {
        Ok(self
            .enrollments
            .lock()
            .await
            .iter()
            .filter(|e| e.workshop_id == workshop_id)
            .cloned()
            .collect())
    }

    async fn list_user_enrollments(
        &self,
        user_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<WorkshopEnrollment>> {
        self.enter(&format!("enrollments:{}", user_id), "fetch enrollments")
            .await?;
        Ok(self
            .enrollments
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect())
    }

    async fn enrollment_status(&self, workshop_id: &str, user_id: &str) -> Result<EnrollmentLookup> {
        let enrollment = self
            .enrollments
            .lock()
            .await
            .iter()
            .find(|e| e.workshop_id == workshop_id && e.user_id == user_id)
            .cloned();
        Ok(match enrollment {
            Some(e) => EnrollmentLookup {
                enrolled: e.status.counts_as_enrolled(),
                status: Some(e.status),
                enrollment: Some(e),
            },
            None => EnrollmentLookup::not_enrolled(),
        })
    }

    async fn get_certificate(&self, certificate_id: &str) -> Result<WorkshopCertificate> {
        self.certificates
            .lock()
            .await
            .iter()
            .find(|c| c.id == certificate_id)
            .cloned()
            .ok_or_else(|| ClientError::http("fetch certificate", StatusCode::NOT_FOUND, None))
    }

    async fn list_user_certificates(&self, user_id: &str) -> Result<Vec<WorkshopCertificate>> {
        self.enter(&format!("certificates:{}", user_id), "fetch certificates")
            .await?;
        Ok(self
            .certificates
            .lock()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn issue_certificate(
        &self,
        workshop_id: &str,
        user_id: &str,
    ) -> Result<WorkshopCertificate> {
        self.enter(&format!("issue:{}:{}", workshop_id, user_id), "issue certificate")
            .await?;
        let mut certificates = self.certificates.lock().await;
        let certificate = WorkshopCertificate {
            id: format!("c{}", certificates.len() + 1),
            workshop_id: workshop_id.to_string(),
            user_id: user_id.to_string(),
            verification_code: format!("CODE{}", certificates.len() + 1),
            issued_at: Utc::now().to_rfc3339(),
            is_verified: true,
            ..Default::default()
        };
        certificates.push(certificate.clone());
        Ok(certificate)
    }

    async fn mark_workshop_completed(
        &self,
        workshop_id: &str,
        _user_id: &str,
    ) -> Result<Option<Workshop>> {
        self.enter(&format!("complete:{}", workshop_id), "mark workshop completed")
            .await?;
        for e in self.enrollments.lock().await.iter_mut() {
            if e.workshop_id == workshop_id && e.status == EnrollmentStatus::Enrolled {
                e.status = EnrollmentStatus::Completed;
            }
        }
        self.set_status(workshop_id, WorkshopStatus::Completed).await;
        Ok(None)
    }

    async fn cancel_workshop(
        &self,
        workshop_id: &str,
        _user_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<Workshop>> {
        self.enter(&format!("cancel:{}", workshop_id), "cancel workshop")
            .await?;
        let mut workshops = self.workshops.lock().await;
        if let Some(w) = workshops.iter_mut().find(|w| w.id == workshop_id) {
            w.status = WorkshopStatus::Cancelled;
            w.cancellation_reason = reason.map(str::to_string);
        }
        Ok(None)
    }

    async fn download_certificate(&self, _certificate_id: &str) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.4".to_vec())
    }

    async fn verify_certificate(&self, code: &str) -> Result<CertificateVerification> {
        let certificate = self
            .certificates
            .lock()
            .await
            .iter()
            .find(|c| c.verification_code == code)
            .cloned();
        Ok(CertificateVerification::classify(certificate, Utc::now()))
    }

    async fn share_certificate(&self, certificate_id: &str) -> Result<ShareLink> {
        Ok(ShareLink {
            shareable_url: format!("https://atelier.example/certificates/{}", certificate_id),
        })
    }

    async fn workshop_stats(&self, workshop_id: &str) -> Result<WorkshopStats> {
        self.enter(&format!("stats:{}", workshop_id), "fetch workshop stats")
            .await?;
        let enrollments = self.enrollments.lock().await;
        let total = enrollments
            .iter()
            .filter(|e| e.workshop_id == workshop_id)
            .count() as u32;
        Ok(WorkshopStats {
            workshop_id: workshop_id.to_string(),
            total_enrollments: total,
            ..Default::default()
        })
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserWorkshopStats> {
        self.enter(&format!("user_stats:{}", user_id), "fetch user stats")
            .await?;
        Ok(UserWorkshopStats {
            user_id: user_id.to_string(),
            ..Default::default()
        })
    }

    async fn approve_creator(&self, _user_id: &str, _approved_by: &str) -> Result<()> {
        Ok(())
    }
}

//! reqwest implementation of `WorkshopApi`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use super::normalize::{normalize, RawWorkshop};
use super::{unwrap_optional_resource, unwrap_resource, WorkshopApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::{
    CertificateVerification, EnrollmentLookup, EnrollmentStatus, NewNotification, NewWorkshop,
    NotificationKind, Participant, ShareLink, UserWorkshopStats, Workshop, WorkshopCertificate,
    WorkshopEnrollment, WorkshopFilters, WorkshopPage, WorkshopPatch, WorkshopStats,
    WorkshopStatus,
};
use crate::notify::{notify_best_effort, HttpNotificationSink, NotificationSink};

pub struct HttpWorkshopApi {
    client: reqwest::Client,
    base_url: String,
    notifier: Arc<dyn NotificationSink>,
}

impl HttpWorkshopApi {
    /// Client with the HTTP notification sink at `{base}/api/notifications`.
    pub fn new(config: &ClientConfig) -> Self {
        let client = build_client(config);
        let notifier = Arc::new(HttpNotificationSink::new(client.clone(), config));
        Self {
            client,
            base_url: config.workshops_url(),
            notifier,
        }
    }

    pub fn with_notifier(config: &ClientConfig, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            client: build_client(config),
            base_url: config.workshops_url(),
            notifier,
        }
    }

    /// `{base}/api/workshops/{segment}/{segment}...`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        tracing::debug!("[WorkshopApi] {} {}", method, url);
        self.client.request(method, url)
    }

    async fn notify(&self, notification: NewNotification) {
        notify_best_effort(self.notifier.as_ref(), notification).await;
    }
}

fn build_client(config: &ClientConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a non-success response to `ClientError::Http`. With `read_body`, the
/// server's `error`/`message` field becomes the error detail.
async fn ensure_success(action: &str, response: Response, read_body: bool) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let server_message = if read_body {
        server_message(response).await
    } else {
        None
    };
    tracing::debug!("[WorkshopApi] {} failed with {}", action, status);
    Err(ClientError::http(action, status, server_message))
}

async fn server_message(response: Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Parse a JSON body; an empty body reads as `Value::Null`.
async fn read_json(response: Response) -> Result<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn workshop_link(workshop_id: &str) -> String {
    format!("/workshops/{}", workshop_id)
}

#[async_trait]
impl WorkshopApi for HttpWorkshopApi {
    async fn list_available(&self, uid: &str, filters: &WorkshopFilters) -> Result<WorkshopPage> {
        let response = self
            .request(Method::GET, &[uid, "available"])
            .query(&filters.to_query())
            .send()
            .await?;
        let response = ensure_success("fetch workshops", response, false).await?;
        match read_json(response).await? {
            Value::Array(items) => Ok(WorkshopPage {
                workshops: serde_json::from_value(Value::Array(items))?,
                ..Default::default()
            }),
            Value::Null => Ok(WorkshopPage::default()),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    async fn get_workshop(&self, workshop_id: &str) -> Result<Workshop> {
        let response = self.request(Method::GET, &[workshop_id]).send().await?;
        let response = ensure_success("fetch workshop", response, false).await?;
        unwrap_resource(read_json(response).await?, "workshop")
    }

    async fn get_workshop_detail(&self, workshop_id: &str) -> Result<Workshop> {
        let response = self
            .request(Method::GET, &["workshop", workshop_id])
            .send()
            .await?;
        let response = ensure_success("fetch workshop details", response, false).await?;
        let raw: RawWorkshop = unwrap_resource(read_json(response).await?, "workshop")?;
        let mut workshop = normalize(raw);
        if workshop.id.is_empty() {
            workshop.id = workshop_id.to_string();
        }
        Ok(workshop)
    }

    async fn list_participants(&self, workshop_id: &str, uid: &str) -> Result<Vec<Participant>> {
        let response = self
            .request(Method::GET, &[workshop_id, uid, "participants"])
            .send()
            .await?;
        let response = ensure_success("fetch participants", response, false).await?;
        unwrap_resource(read_json(response).await?, "participants")
    }

    async fn create_workshop(&self, uid: &str, draft: &NewWorkshop) -> Result<Workshop> {
        let response = self
            .request(Method::POST, &[uid])
            .json(draft)
            .send()
            .await?;
        let response = ensure_success("create workshop", response, true).await?;
        let workshop: Workshop = unwrap_resource(read_json(response).await?, "workshop")?;

        if workshop.status == WorkshopStatus::PendingApproval {
            self.notify(
                NewNotification::new(
                    uid,
                    NotificationKind::WorkshopPendingApproval,
                    "Workshop submitted for review",
                    format!(
                        "\"{}\" will be visible once an administrator approves it.",
                        workshop.title
                    ),
                )
                .with_link(workshop_link(&workshop.id))
                .with_data(json!({ "workshopId": workshop.id })),
            )
            .await;
        }
        Ok(workshop)
    }

    async fn list_created(&self, user_id: &str) -> Result<Vec<Workshop>> {
        let response = self
            .request(Method::GET, &[user_id, "created"])
            .send()
            .await?;
        let response = ensure_success("fetch created workshops", response, false).await?;
        unwrap_resource(read_json(response).await?, "workshops")
    }

    async fn update_workshop(
        &self,
        workshop_id: &str,
        uid: Option<&str>,
        patch: &WorkshopPatch,
    ) -> Result<Option<Workshop>> {
        let request = match uid {
            Some(uid) => self.request(Method::PUT, &[workshop_id, uid]),
            None => self.request(Method::PUT, &[workshop_id]),
        };
        let response = request.json(patch).send().await?;
        let response = ensure_success("update workshop", response, true).await?;
        unwrap_optional_resource(read_json(response).await?, "workshop")
    }

    async fn publish_workshop(&self, workshop_id: &str, uid: &str) -> Result<Option<Workshop>> {
        let response = self
            .request(Method::PUT, &[workshop_id, uid, "publish"])
            .send()
            .await?;
        let response = ensure_success("publish workshop", response, true).await?;
        unwrap_optional_resource(read_json(response).await?, "workshop")
    }

    async fn delete_workshop(&self, workshop_id: &str) -> Result<()> {
        let response = self.request(Method::DELETE, &[workshop_id]).send().await?;
        ensure_success("delete workshop", response, false).await?;
        Ok(())
    }

    async fn enroll(&self, workshop_id: &str, user_id: &str) -> Result<Option<WorkshopEnrollment>> {
        let response = self
            .request(Method::POST, &[workshop_id, user_id, "enroll"])
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(ClientError::AlreadyEnrolled);
        }
        let response = ensure_success("enroll in workshop", response, true).await?;
        let enrollment: Option<WorkshopEnrollment> =
            unwrap_optional_resource(read_json(response).await?, "enrollment")?;

        let title = enrollment
            .as_ref()
            .map(|e| e.workshop_title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "the workshop".to_string());
        let waitlisted = enrollment
            .as_ref()
            .is_some_and(|e| e.status == EnrollmentStatus::Waitlisted);
        let message = if waitlisted {
            format!("You have been added to the waitlist for {}.", title)
        } else {
            format!("You are enrolled in {}.", title)
        };
        self.notify(
            NewNotification::new(
                user_id,
                NotificationKind::WorkshopEnrollment,
                "Workshop enrollment",
                message,
            )
            .with_link(workshop_link(workshop_id))
            .with_data(json!({ "workshopId": workshop_id, "waitlisted": waitlisted })),
        )
        .await;

        Ok(enrollment)
    }

    async fn unenroll(&self, workshop_id: &str, user_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &[workshop_id, user_id, "enroll"])
            .send()
            .await?;
        ensure_success("unenroll from workshop", response, false).await?;
        Ok(())
    }

    async fn list_workshop_enrollments(&self, workshop_id: &str) -> Result<Vec<WorkshopEnrollment>> {
        let response = self
            .request(Method::GET, &[workshop_id, "enrollments"])
            .send()
            .await?;
        let response = ensure_success("fetch workshop enrollments", response, false).await?;
        unwrap_resource(read_json(response).await?, "enrollments")
    }

    async fn list_user_enrollments(
        &self,
        user_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<WorkshopEnrollment>> {
        let response = self
            .request(Method::GET, &[user_id, "enrollments"])
            .send()
            .await?;
        let response = ensure_success("fetch enrollments", response, false).await?;
        let enrollments: Vec<WorkshopEnrollment> =
            unwrap_resource(read_json(response).await?, "enrollments")?;
        Ok(match status {
            Some(status) => enrollments
                .into_iter()
                .filter(|e| e.status == status)
                .collect(),
            None => enrollments,
        })
    }

    async fn enrollment_status(&self, workshop_id: &str, user_id: &str) -> Result<EnrollmentLookup> {
        let response = self
            .request(Method::GET, &[workshop_id, "enrollment", user_id])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(EnrollmentLookup::not_enrolled());
        }
        let response = ensure_success("check enrollment status", response, false).await?;
        Ok(serde_json::from_value(read_json(response).await?)?)
    }

    async fn get_certificate(&self, certificate_id: &str) -> Result<WorkshopCertificate> {
        let response = self
            .request(Method::GET, &["certificates", certificate_id])
            .send()
            .await?;
        let response = ensure_success("fetch certificate", response, false).await?;
        unwrap_resource(read_json(response).await?, "certificate")
    }

    async fn list_user_certificates(&self, user_id: &str) -> Result<Vec<WorkshopCertificate>> {
        let response = self
            .request(Method::GET, &[user_id, "certificates"])
            .send()
            .await?;
        let response = ensure_success("fetch certificates", response, false).await?;
        unwrap_resource(read_json(response).await?, "certificates")
    }

    async fn issue_certificate(
        &self,
        workshop_id: &str,
        user_id: &str,
    ) -> Result<WorkshopCertificate> {
        let response = self
            .request(Method::POST, &[workshop_id, "certificate"])
            .json(&json!({ "userId": user_id }))
            .send()
            .await?;
        let response = ensure_success("issue certificate", response, true).await?;
        let certificate: WorkshopCertificate =
            unwrap_resource(read_json(response).await?, "certificate")?;

        let recipient = if certificate.user_id.is_empty() {
            user_id
        } else {
            certificate.user_id.as_str()
        };
        self.notify(
            NewNotification::new(
                recipient,
                NotificationKind::CertificateIssued,
                "Certificate issued",
                format!(
                    "Your certificate for {} is ready. Verification code: {}",
                    certificate.workshop_title, certificate.verification_code
                ),
            )
            .with_link(format!("/certificates/{}", certificate.id))
            .with_data(json!({
                "workshopId": workshop_id,
                "certificateId": certificate.id,
            })),
        )
        .await;

        Ok(certificate)
    }

    async fn mark_workshop_completed(
        &self,
        workshop_id: &str,
        user_id: &str,
    ) -> Result<Option<Workshop>> {
        let response = self
            .request(Method::POST, &[workshop_id, "complete"])
            .json(&json!({ "userId": user_id }))
            .send()
            .await?;
        let response = ensure_success("mark workshop completed", response, false).await?;
        let workshop: Option<Workshop> =
            unwrap_optional_resource(read_json(response).await?, "workshop")?;

        let title = workshop
            .as_ref()
            .map(|w| w.title.clone())
            .unwrap_or_else(|| "Your workshop".to_string());
        self.notify(
            NewNotification::new(
                user_id,
                NotificationKind::WorkshopCompleted,
                "Workshop completed",
                format!("{} has been marked as completed.", title),
            )
            .with_link(workshop_link(workshop_id))
            .with_data(json!({ "workshopId": workshop_id })),
        )
        .await;

        Ok(workshop)
    }

    async fn cancel_workshop(
        &self,
        workshop_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<Workshop>> {
        let response = self
            .request(Method::POST, &[workshop_id, "cancel"])
            .json(&json!({ "userId": user_id, "reason": reason }))
            .send()
            .await?;
        let response = ensure_success("cancel workshop", response, true).await?;
        let workshop: Option<Workshop> =
            unwrap_optional_resource(read_json(response).await?, "workshop")?;

        // Fan out to everyone holding a seat or a waitlist spot.
        match self.list_workshop_enrollments(workshop_id).await {
            Ok(enrollments) => {
                let affected = enrollments.into_iter().filter(|e| {
                    matches!(
                        e.status,
                        EnrollmentStatus::Enrolled | EnrollmentStatus::Waitlisted
                    ) && e.user_id != user_id
                });
                for enrollment in affected {
                    let title = workshop
                        .as_ref()
                        .map(|w| w.title.clone())
                        .unwrap_or_else(|| enrollment.workshop_title.clone());
                    let mut message = format!("{} has been cancelled.", title);
                    if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
                        message.push_str(&format!(" Reason: {}", reason));
                    }
                    self.notify(
                        NewNotification::new(
                            &enrollment.user_id,
                            NotificationKind::WorkshopCancelled,
                            "Workshop cancelled",
                            message,
                        )
                        .with_link(workshop_link(workshop_id))
                        .with_data(json!({ "workshopId": workshop_id, "reason": reason })),
                    )
                    .await;
                }
            }
            Err(e) => tracing::warn!(
                "[WorkshopApi] cancelled {} but could not list enrollments to notify: {}",
                workshop_id,
                e
            ),
        }

        Ok(workshop)
    }

    async fn download_certificate(&self, certificate_id: &str) -> Result<Vec<u8>> {
        let response = self
            .request(Method::GET, &["certificates", certificate_id, "download"])
            .send()
            .await?;
        let response = ensure_success("download certificate", response, false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn verify_certificate(&self, code: &str) -> Result<CertificateVerification> {
        let response = self
            .request(Method::GET, &["certificates", "verify", code])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(CertificateVerification::classify(None, Utc::now()));
        }
        let response = ensure_success("verify certificate", response, false).await?;
        let certificate: Option<WorkshopCertificate> =
            unwrap_optional_resource(read_json(response).await?, "certificate")?;
        Ok(CertificateVerification::classify(certificate, Utc::now()))
    }

    async fn share_certificate(&self, certificate_id: &str) -> Result<ShareLink> {
        let response = self
            .request(Method::POST, &["certificates", certificate_id, "share"])
            .send()
            .await?;
        let response = ensure_success("share certificate", response, false).await?;
        Ok(serde_json::from_value(read_json(response).await?)?)
    }

    async fn workshop_stats(&self, workshop_id: &str) -> Result<WorkshopStats> {
        let response = self
            .request(Method::GET, &[workshop_id, "stats"])
            .send()
            .await?;
        let response = ensure_success("fetch workshop stats", response, false).await?;
        unwrap_resource(read_json(response).await?, "stats")
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserWorkshopStats> {
        let response = self
            .request(Method::GET, &[user_id, "stats"])
            .send()
            .await?;
        let response = ensure_success("fetch user stats", response, false).await?;
        unwrap_resource(read_json(response).await?, "stats")
    }

    async fn approve_creator(&self, user_id: &str, approved_by: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &["creators", "approve"])
            .json(&json!({ "userId": user_id, "approvedBy": approved_by }))
            .send()
            .await?;
        ensure_success("approve creator", response, true).await?;

        self.notify(
            NewNotification::new(
                user_id,
                NotificationKind::CreatorApproved,
                "Creator access approved",
                "You can now publish workshops.",
            )
            .with_link("/workshops/create"),
        )
        .await;
        Ok(())
    }
}

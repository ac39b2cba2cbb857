//! Remote access layer: one method per backend workshop operation.
//!
//! `WorkshopApi` is the seam the orchestrator depends on; `HttpWorkshopApi`
//! is the reqwest implementation. The layer keeps no state and no cache.

pub mod client;
pub mod normalize;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    CertificateVerification, EnrollmentLookup, EnrollmentStatus, NewWorkshop, Participant,
    ShareLink, UserWorkshopStats, Workshop, WorkshopCertificate, WorkshopEnrollment,
    WorkshopFilters, WorkshopPage, WorkshopPatch, WorkshopStats,
};

pub use client::HttpWorkshopApi;
pub use normalize::{normalize, RawTimestamp, RawWorkshop};

#[async_trait]
pub trait WorkshopApi: Send + Sync {
    /// `GET /{uid}/available?<filters>`
    async fn list_available(&self, uid: &str, filters: &WorkshopFilters) -> Result<WorkshopPage>;

    /// `GET /{workshopId}` (list shape)
    async fn get_workshop(&self, workshop_id: &str) -> Result<Workshop>;

    /// `GET /workshop/{workshopId}` (detail shape, normalized)
    async fn get_workshop_detail(&self, workshop_id: &str) -> Result<Workshop>;

    /// `GET /{workshopId}/{uid}/participants`
    async fn list_participants(&self, workshop_id: &str, uid: &str) -> Result<Vec<Participant>>;

    /// `POST /{uid}`
    async fn create_workshop(&self, uid: &str, draft: &NewWorkshop) -> Result<Workshop>;

    /// `GET /{userId}/created`
    async fn list_created(&self, user_id: &str) -> Result<Vec<Workshop>>;

    /// `PUT /{workshopId}/{uid}`, or `PUT /{workshopId}` without a uid.
    /// `None` when the backend acknowledges without echoing the workshop.
    async fn update_workshop(
        &self,
        workshop_id: &str,
        uid: Option<&str>,
        patch: &WorkshopPatch,
    ) -> Result<Option<Workshop>>;

    /// `PUT /{workshopId}/{uid}/publish`
    async fn publish_workshop(&self, workshop_id: &str, uid: &str) -> Result<Option<Workshop>>;

    /// `DELETE /{workshopId}`
    async fn delete_workshop(&self, workshop_id: &str) -> Result<()>;

    /// `POST /{workshopId}/{userId}/enroll`; 409 is `ClientError::AlreadyEnrolled`.
    async fn enroll(&self, workshop_id: &str, user_id: &str) -> Result<Option<WorkshopEnrollment>>;

    /// `DELETE /{workshopId}/{userId}/enroll`
    async fn unenroll(&self, workshop_id: &str, user_id: &str) -> Result<()>;

    /// `GET /{workshopId}/enrollments`
    async fn list_workshop_enrollments(&self, workshop_id: &str) -> Result<Vec<WorkshopEnrollment>>;

    /// `GET /{userId}/enrollments`, status filter applied after the fetch.
    async fn list_user_enrollments(
        &self,
        user_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<WorkshopEnrollment>>;

    /// `GET /{workshopId}/enrollment/{userId}`; 404 is "not enrolled".
    async fn enrollment_status(&self, workshop_id: &str, user_id: &str) -> Result<EnrollmentLookup>;

    /// `GET /certificates/{certificateId}`
    async fn get_certificate(&self, certificate_id: &str) -> Result<WorkshopCertificate>;

    /// `GET /{userId}/certificates`
    async fn list_user_certificates(&self, user_id: &str) -> Result<Vec<WorkshopCertificate>>;

    /// `POST /{workshopId}/certificate`
    async fn issue_certificate(&self, workshop_id: &str, user_id: &str)
        -> Result<WorkshopCertificate>;

    /// `POST /{workshopId}/complete`
    async fn mark_workshop_completed(
        &self,
        workshop_id: &str,
        user_id: &str,
    ) -> Result<Option<Workshop>>;

    /// `POST /{workshopId}/cancel`
    async fn cancel_workshop(
        &self,
        workshop_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<Workshop>>;

    /// `GET /certificates/{id}/download`
    async fn download_certificate(&self, certificate_id: &str) -> Result<Vec<u8>>;

    /// `GET /certificates/verify/{code}`
    async fn verify_certificate(&self, code: &str) -> Result<CertificateVerification>;

    /// `POST /certificates/{id}/share`
    async fn share_certificate(&self, certificate_id: &str) -> Result<ShareLink>;

    /// `GET /{workshopId}/stats`
    async fn workshop_stats(&self, workshop_id: &str) -> Result<WorkshopStats>;

    /// `GET /{userId}/stats`
    async fn user_stats(&self, user_id: &str) -> Result<UserWorkshopStats>;

    /// `POST /creators/approve`
    async fn approve_creator(&self, user_id: &str, approved_by: &str) -> Result<()>;
}

/// Decode a body that is either the resource itself or an object wrapping it
/// under `key` (`{"workshop": {...}}`, `{"enrollments": [...]}`).
pub fn unwrap_resource<T: DeserializeOwned>(body: Value, key: &str) -> Result<T> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    Ok(serde_json::from_value(inner)?)
}

/// Like `unwrap_resource`, but an empty or resource-less acknowledgement is `None`.
pub fn unwrap_optional_resource<T: DeserializeOwned>(body: Value, key: &str) -> Result<Option<T>> {
    match body {
        Value::Null => Ok(None),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Null) => Ok(None),
            Some(inner) => Ok(Some(serde_json::from_value(inner)?)),
            // A bare resource carries its own id.
            None if map.contains_key("id") => Ok(Some(serde_json::from_value(Value::Object(map))?)),
            None => Ok(None),
        },
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkshopEnrollment,
    WorkshopPendingApproval,
    WorkshopCompleted,
    WorkshopCancelled,
    CertificateIssued,
    CreatorApproved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkshopEnrollment => "workshop_enrollment",
            Self::WorkshopPendingApproval => "workshop_pending_approval",
            Self::WorkshopCompleted => "workshop_completed",
            Self::WorkshopCancelled => "workshop_cancelled",
            Self::CertificateIssued => "certificate_issued",
            Self::CreatorApproved => "creator_approved",
        }
    }
}

/// Body of `POST /api/notifications`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NewNotification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

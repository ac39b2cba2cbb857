use serde::{Deserialize, Serialize};

/// Aggregate numbers for one workshop, replaced wholesale on refetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkshopStats {
    pub workshop_id: String,
    pub total_enrollments: u32,
    pub active_enrollments: u32,
    pub waitlist_count: u32,
    pub completion_count: u32,
    pub completion_rate: f64,
    pub attendance_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub rating_count: u32,
    pub certificates_issued: u32,
}

/// Aggregate numbers for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserWorkshopStats {
    pub user_id: String,
    pub enrolled_count: u32,
    pub completed_count: u32,
    pub upcoming_count: u32,
    pub created_count: u32,
    pub certificates_count: u32,
    pub total_learning_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating_given: Option<f64>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::time;
use crate::error::{ClientError, Result};

/// Persisted lifecycle state of a workshop.
///
/// Statuses this client does not know are kept verbatim in `Unknown` so they
/// still round-trip and render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum WorkshopStatus {
    #[default]
    Draft,
    PendingApproval,
    Published,
    Cancelled,
    Completed,
    Unknown(String),
}

impl WorkshopStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    fn known(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending" | "pending_approval" => Some(Self::PendingApproval),
            "published" => Some(Self::Published),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl From<String> for WorkshopStatus {
    fn from(raw: String) -> Self {
        Self::known(&raw).unwrap_or(Self::Unknown(raw))
    }
}

impl From<WorkshopStatus> for String {
    fn from(status: WorkshopStatus) -> Self {
        match status {
            WorkshopStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for WorkshopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input; the wire decoding above is lenient.
impl std::str::FromStr for WorkshopStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::known(s).ok_or_else(|| format!("Unknown workshop status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkshopCategory {
    DataScience,
    MachineLearning,
    DeepLearning,
    DataVisualization,
    Statistics,
    DataEngineering,
    BigData,
    Python,
    R,
    Sql,
    #[default]
    #[serde(other)]
    Other,
}

impl WorkshopCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataScience => "data-science",
            Self::MachineLearning => "machine-learning",
            Self::DeepLearning => "deep-learning",
            Self::DataVisualization => "data-visualization",
            Self::Statistics => "statistics",
            Self::DataEngineering => "data-engineering",
            Self::BigData => "big-data",
            Self::Python => "python",
            Self::R => "r",
            Self::Sql => "sql",
            Self::Other => "other",
        }
    }

    pub const ALL: [WorkshopCategory; 11] = [
        Self::DataScience,
        Self::MachineLearning,
        Self::DeepLearning,
        Self::DataVisualization,
        Self::Statistics,
        Self::DataEngineering,
        Self::BigData,
        Self::Python,
        Self::R,
        Self::Sql,
        Self::Other,
    ];
}

/// Strict parse for user input; unknown wire values decode as `Other` instead.
impl std::str::FromStr for WorkshopCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Unknown workshop category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkshopDifficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl WorkshopDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkshopFormat {
    #[default]
    Online,
    #[serde(alias = "in_person", alias = "offline")]
    InPerson,
    Hybrid,
}

impl WorkshopFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::InPerson => "in-person",
            Self::Hybrid => "hybrid",
        }
    }
}

pub const DEFAULT_DURATION_MINUTES: u32 = 120;
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A scheduled learning event, in the shape every view renders.
///
/// Every payload decodes through `RawWorkshop` and `normalize`: missing or
/// `null` fields take the documented defaults, so list-shape and detail-shape
/// documents produce the same value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "crate::api::normalize::RawWorkshop")]
pub struct Workshop {
    pub id: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub category: WorkshopCategory,
    pub difficulty: WorkshopDifficulty,
    pub format: WorkshopFormat,

    pub creator_id: String,
    pub creator_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_photo_url: Option<String>,

    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Clock time, `HH:MM`.
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    /// Minutes.
    pub duration: u32,

    pub max_participants: u32,
    pub current_enrollments: u32,
    pub waitlist_count: u32,

    pub learning_objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub price: f64,
    pub currency: String,

    pub status: WorkshopStatus,

    pub is_recorded: bool,
    pub is_interactive: bool,
    pub provides_certificate: bool,
    pub allow_waitlist: bool,
    pub auto_approve_enrollments: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Default for Workshop {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            short_description: String::new(),
            category: WorkshopCategory::default(),
            difficulty: WorkshopDifficulty::default(),
            format: WorkshopFormat::Online,
            creator_id: String::new(),
            creator_name: String::new(),
            creator_photo_url: None,
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            duration: DEFAULT_DURATION_MINUTES,
            max_participants: 0,
            current_enrollments: 0,
            waitlist_count: 0,
            learning_objectives: Vec::new(),
            prerequisites: Vec::new(),
            requirements: Vec::new(),
            tags: Vec::new(),
            thumbnail_url: None,
            banner_url: None,
            meeting_url: None,
            recording_url: None,
            location: None,
            price: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            status: WorkshopStatus::Draft,
            is_recorded: false,
            is_interactive: false,
            provides_certificate: false,
            allow_waitlist: false,
            auto_approve_enrollments: true,
            enrollment_deadline: None,
            cancellation_reason: None,
            created_at: None,
            updated_at: None,
            published_at: None,
            completed_at: None,
        }
    }
}

impl Workshop {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        time::at(&self.date, &self.start_time)
    }

    /// Scheduled end; falls back to start + duration when `endTime` is missing.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        time::at(&self.date, &self.end_time).or_else(|| {
            self.starts_at()
                .map(|start| start + chrono::Duration::minutes(i64::from(self.duration)))
        })
    }

    pub fn enrollment_deadline_at(&self) -> Option<DateTime<Utc>> {
        self.enrollment_deadline
            .as_deref()
            .and_then(time::parse_instant)
    }

    pub fn is_full(&self) -> bool {
        self.current_enrollments >= self.max_participants
    }

    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }
}

/// Payload for `POST /{uid}`: the draft fields of a new workshop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWorkshop {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub category: WorkshopCategory,
    pub difficulty: WorkshopDifficulty,
    pub format: WorkshopFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    pub duration: u32,
    pub max_participants: u32,
    pub learning_objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub price: f64,
    pub currency: String,
    pub is_recorded: bool,
    pub is_interactive: bool,
    pub provides_certificate: bool,
    pub allow_waitlist: bool,
    pub auto_approve_enrollments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_deadline: Option<String>,
}

impl Default for NewWorkshop {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            short_description: String::new(),
            category: WorkshopCategory::default(),
            difficulty: WorkshopDifficulty::default(),
            format: WorkshopFormat::Online,
            creator_name: None,
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            duration: DEFAULT_DURATION_MINUTES,
            max_participants: 0,
            learning_objectives: Vec::new(),
            prerequisites: Vec::new(),
            requirements: Vec::new(),
            tags: Vec::new(),
            thumbnail_url: None,
            meeting_url: None,
            location: None,
            price: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            is_recorded: false,
            is_interactive: false,
            provides_certificate: false,
            allow_waitlist: false,
            auto_approve_enrollments: true,
            enrollment_deadline: None,
        }
    }
}

impl NewWorkshop {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ClientError::InvalidInput("title is required".to_string()));
        }
        if time::parse_date(&self.date).is_none() {
            return Err(ClientError::InvalidInput(format!(
                "date '{}' is not a calendar date",
                self.date
            )));
        }
        let start = time::parse_clock(&self.start_time);
        let end = time::parse_clock(&self.end_time);
        match (start, end) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => {
                return Err(ClientError::InvalidInput(
                    "end time must be after start time".to_string(),
                ))
            }
            _ => {
                return Err(ClientError::InvalidInput(
                    "start and end times must be HH:MM".to_string(),
                ))
            }
        }
        if self.max_participants == 0 {
            return Err(ClientError::InvalidInput(
                "maxParticipants must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fields owned by the server; never sent as part of an update.
const SERVER_OWNED_FIELDS: &[&str] = &[
    "id",
    "creatorId",
    "status",
    "currentEnrollments",
    "waitlistCount",
    "createdAt",
    "updatedAt",
    "publishedAt",
    "completedAt",
];

/// Sparse update body: only the fields that differ between two versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkshopPatch(Map<String, Value>);

impl WorkshopPatch {
    /// Field-wise diff of `edited` against `base`.
    pub fn between(base: &Workshop, edited: &Workshop) -> Result<Self> {
        let base = object_of(base)?;
        let edited = object_of(edited)?;
        let mut changes = Map::new();
        for (key, value) in edited.iter() {
            if SERVER_OWNED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            if base.get(key) != Some(value) {
                changes.insert(key.clone(), value.clone());
            }
        }
        // Optional fields cleared in the edit are absent from `edited`.
        for key in base.keys() {
            if !edited.contains_key(key) && !SERVER_OWNED_FIELDS.contains(&key.as_str()) {
                changes.insert(key.clone(), Value::Null);
            }
        }
        Ok(Self(changes))
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// The workshop as it looks once the patch is applied.
    pub fn apply_to(&self, workshop: &Workshop) -> Result<Workshop> {
        let mut object = object_of(workshop)?;
        for (key, value) in self.0.iter() {
            object.insert(key.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

fn object_of(workshop: &Workshop) -> Result<Map<String, Value>> {
    match serde_json::to_value(workshop)? {
        Value::Object(map) => Ok(map),
        other => Err(ClientError::Decode(format!(
            "workshop serialized to non-object: {}",
            other
        ))),
    }
}

/// Filters for the available-workshops listing.
///
/// `status` is kept for local filtering only; the backend never receives it
/// as a query parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopFilters {
    pub status: Option<WorkshopStatus>,
    pub category: Option<WorkshopCategory>,
    pub creator_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl WorkshopFilters {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("category", category.as_str().to_string()));
        }
        if let Some(creator_id) = &self.creator_id {
            query.push(("creatorId", creator_id.clone()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }
}

/// One page of the available-workshops listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopPage {
    #[serde(default)]
    pub workshops: Vec<Workshop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

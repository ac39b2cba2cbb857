//! Detail-shape workshop payloads and their normalization into `Workshop`.
//!
//! `GET /workshop/{id}` returns the backend's stored document: timestamps as
//! `{_seconds, _nanoseconds}` objects, `enrolledCount` instead of
//! `currentEnrollments`, and many optional fields simply absent. `normalize`
//! turns that into the list shape. Feeding an already-normalized workshop
//! back through it yields the same value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::models::time;
use crate::models::{
    Workshop, WorkshopCategory, WorkshopDifficulty, WorkshopFormat, WorkshopStatus,
    DEFAULT_CURRENCY, DEFAULT_DURATION_MINUTES, DEFAULT_TIMEZONE,
};

/// A backend timestamp in any of the encodings seen on the wire.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds {
        #[serde(rename = "_seconds", alias = "seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds", alias = "nanoseconds", default)]
        nanoseconds: u32,
    },
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Seconds {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            RawTimestamp::Text(text) => time::parse_instant(text),
        }
    }

    /// ISO-8601 with millisecond precision; text that already parses is kept as is.
    pub fn to_iso(&self) -> Option<String> {
        match self {
            RawTimestamp::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            RawTimestamp::Text(_) => None,
            other => other
                .instant()
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// `YYYY-MM-DD` in UTC.
    pub fn to_calendar_date(&self) -> Option<String> {
        match self {
            RawTimestamp::Text(text) => time::parse_date(text)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .or_else(|| Some(text.clone()).filter(|t| !t.trim().is_empty())),
            other => other
                .instant()
                .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string()),
        }
    }
}

/// Any JSON value; a value `T` cannot decode from becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Workshop document in any shape the backend returns, every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkshop {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<WorkshopCategory>,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty: Option<WorkshopDifficulty>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<WorkshopFormat>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
    pub creator_photo_url: Option<String>,
    pub date: Option<RawTimestamp>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
    pub duration: Option<u32>,
    pub max_participants: Option<u32>,
    pub current_enrollments: Option<u32>,
    pub enrolled_count: Option<u32>,
    pub waitlist_count: Option<u32>,
    pub learning_objectives: Option<Vec<String>>,
    pub prerequisites: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub thumbnail_url: Option<String>,
    pub banner_url: Option<String>,
    pub meeting_url: Option<String>,
    pub recording_url: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<WorkshopStatus>,
    pub is_recorded: Option<bool>,
    pub is_interactive: Option<bool>,
    pub provides_certificate: Option<bool>,
    pub allow_waitlist: Option<bool>,
    pub auto_approve_enrollments: Option<bool>,
    pub enrollment_deadline: Option<RawTimestamp>,
    pub cancellation_reason: Option<String>,
    pub created_at: Option<RawTimestamp>,
    pub updated_at: Option<RawTimestamp>,
    pub published_at: Option<RawTimestamp>,
    pub completed_at: Option<RawTimestamp>,
}

impl From<RawWorkshop> for Workshop {
    fn from(raw: RawWorkshop) -> Self {
        normalize(raw)
    }
}

pub fn normalize(raw: RawWorkshop) -> Workshop {
    let iso = |ts: Option<RawTimestamp>| ts.as_ref().and_then(RawTimestamp::to_iso);

    Workshop {
        id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        short_description: raw.short_description.unwrap_or_default(),
        category: raw.category.unwrap_or_default(),
        difficulty: raw.difficulty.unwrap_or_default(),
        format: raw.format.unwrap_or(WorkshopFormat::Online),
        creator_id: raw.creator_id.unwrap_or_default(),
        creator_name: raw.creator_name.unwrap_or_default(),
        creator_photo_url: raw.creator_photo_url,
        date: raw
            .date
            .as_ref()
            .and_then(RawTimestamp::to_calendar_date)
            .unwrap_or_default(),
        start_time: raw.start_time.unwrap_or_default(),
        end_time: raw.end_time.unwrap_or_default(),
        timezone: raw
            .timezone
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        duration: raw.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        max_participants: raw.max_participants.unwrap_or(0),
        current_enrollments: raw.current_enrollments.or(raw.enrolled_count).unwrap_or(0),
        waitlist_count: raw.waitlist_count.unwrap_or(0),
        learning_objectives: raw.learning_objectives.unwrap_or_default(),
        prerequisites: raw.prerequisites.unwrap_or_default(),
        requirements: raw.requirements.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
        thumbnail_url: raw.thumbnail_url,
        banner_url: raw.banner_url,
        meeting_url: raw.meeting_url,
        recording_url: raw.recording_url,
        location: raw.location,
        price: raw.price.unwrap_or(0.0),
        currency: raw
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        status: raw.status.unwrap_or_default(),
        is_recorded: raw.is_recorded.unwrap_or(false),
        is_interactive: raw.is_interactive.unwrap_or(false),
        provides_certificate: raw.provides_certificate.unwrap_or(false),
        allow_waitlist: raw.allow_waitlist.unwrap_or(false),
        auto_approve_enrollments: raw.auto_approve_enrollments != Some(false),
        enrollment_deadline: iso(raw.enrollment_deadline),
        cancellation_reason: raw.cancellation_reason,
        created_at: iso(raw.created_at),
        updated_at: iso(raw.updated_at),
        published_at: iso(raw.published_at),
        completed_at: iso(raw.completed_at),
    }
}

//! Pure queries over the current state. No I/O; `now` is always a parameter.

use chrono::{DateTime, Utc};

use crate::models::{time, EnrollmentStatus, Workshop, WorkshopEnrollment, WorkshopStatus};
use crate::session::SessionUser;

/// Presentation status, computed from the clock and the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayStatus {
    Upcoming,
    InProgress,
    Ended,
    Cancelled,
    Completed,
    /// Schedule could not be read; shows the persisted status.
    Persisted(WorkshopStatus),
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayStatus::Upcoming => f.write_str("Upcoming"),
            DisplayStatus::InProgress => f.write_str("In Progress"),
            DisplayStatus::Ended => f.write_str("Ended"),
            DisplayStatus::Cancelled => f.write_str("Cancelled"),
            DisplayStatus::Completed => f.write_str("Completed"),
            DisplayStatus::Persisted(status) => f.write_str(status.as_str()),
        }
    }
}

fn enrollment_for<'a>(
    enrollments: &'a [WorkshopEnrollment],
    workshop_id: &str,
) -> impl Iterator<Item = &'a WorkshopEnrollment> + 'a {
    let workshop_id = workshop_id.to_string();
    enrollments
        .iter()
        .filter(move |e| e.workshop_id == workshop_id)
}

pub fn is_enrolled(enrollments: &[WorkshopEnrollment], workshop_id: &str) -> bool {
    enrollment_for(enrollments, workshop_id).any(|e| e.status.counts_as_enrolled())
}

pub fn can_enroll(
    user: Option<&SessionUser>,
    workshop: &Workshop,
    enrollments: &[WorkshopEnrollment],
    now: DateTime<Utc>,
) -> bool {
    let Some(user) = user else {
        return false;
    };
    if workshop.status != WorkshopStatus::Published {
        return false;
    }
    if workshop.creator_id == user.uid {
        return false;
    }
    if is_enrolled(enrollments, &workshop.id) {
        return false;
    }
    if workshop.enrollment_deadline_at().is_some_and(|deadline| now > deadline) {
        return false;
    }
    if workshop.starts_at().is_some_and(|start| now > start) {
        return false;
    }
    // A full workshop that keeps a waitlist still accepts the request.
    workshop.current_enrollments < workshop.max_participants || workshop.allow_waitlist
}

pub fn display_status(workshop: &Workshop, now: DateTime<Utc>) -> DisplayStatus {
    match workshop.status {
        WorkshopStatus::Cancelled => return DisplayStatus::Cancelled,
        WorkshopStatus::Completed => return DisplayStatus::Completed,
        _ => {}
    }
    match (workshop.starts_at(), workshop.ends_at()) {
        (Some(start), _) if now < start => DisplayStatus::Upcoming,
        (Some(_), Some(end)) if now <= end => DisplayStatus::InProgress,
        (Some(_), Some(_)) => DisplayStatus::Ended,
        _ => DisplayStatus::Persisted(workshop.status.clone()),
    }
}

/// `Sunday, June 1, 2025`; the raw value when it is not a date.
pub fn format_workshop_date(workshop: &Workshop) -> String {
    match time::parse_date(&workshop.date) {
        Some(date) => date.format("%A, %B %-d, %Y").to_string(),
        None => workshop.date.clone(),
    }
}

/// `10:00 AM - 12:00 PM UTC`
pub fn format_workshop_time(workshop: &Workshop) -> String {
    let clock = |value: &str| {
        time::parse_clock(value)
            .map(|t| t.format("%-I:%M %p").to_string())
            .unwrap_or_else(|| value.to_string())
    };
    let range = match (workshop.start_time.is_empty(), workshop.end_time.is_empty()) {
        (false, false) => format!(
            "{} - {}",
            clock(&workshop.start_time),
            clock(&workshop.end_time)
        ),
        (false, true) => clock(&workshop.start_time),
        _ => return String::new(),
    };
    if workshop.timezone.is_empty() {
        range
    } else {
        format!("{} {}", range, workshop.timezone)
    }
}

fn with_enrollment_status<'a>(
    workshops: &'a [Workshop],
    enrollments: &'a [WorkshopEnrollment],
    accept: impl Fn(EnrollmentStatus) -> bool + 'a,
) -> impl Iterator<Item = &'a Workshop> + 'a {
    workshops.iter().filter(move |w| {
        enrollment_for(enrollments, &w.id).any(|e| accept(e.status))
    })
}

pub fn enrolled_workshops(
    workshops: &[Workshop],
    enrollments: &[WorkshopEnrollment],
) -> Vec<Workshop> {
    with_enrollment_status(workshops, enrollments, |s| s.counts_as_enrolled())
        .cloned()
        .collect()
}

pub fn upcoming_workshops(
    workshops: &[Workshop],
    enrollments: &[WorkshopEnrollment],
    now: DateTime<Utc>,
) -> Vec<Workshop> {
    with_enrollment_status(workshops, enrollments, |s| s.counts_as_enrolled())
        .filter(|w| w.status != WorkshopStatus::Cancelled)
        .filter(|w| w.starts_at().is_some_and(|start| start > now))
        .cloned()
        .collect()
}

pub fn completed_workshops(
    workshops: &[Workshop],
    enrollments: &[WorkshopEnrollment],
) -> Vec<Workshop> {
    with_enrollment_status(workshops, enrollments, |s| s == EnrollmentStatus::Completed)
        .cloned()
        .collect()
}

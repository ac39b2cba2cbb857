//! Integration test: run `HttpWorkshopApi` against an in-process axum backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::api::WorkshopApi;
use atelier_core::models::{
    EnrollmentStatus, NewNotification, NewWorkshop, NotificationKind, VerificationOutcome,
    WorkshopFilters, WorkshopFormat, WorkshopStatus, CERTIFICATE_EXPIRED, CERTIFICATE_NOT_FOUND,
};
use atelier_core::notify::NotificationSink;
use atelier_core::session::{SessionUser, SharedSession};
use atelier_core::{ClientConfig, ClientError, HttpWorkshopApi, WorkshopOrchestrator};
use axum::extract::{Path, RawQuery};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Give server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://{}", addr)
}

fn api_for(base_url: &str) -> HttpWorkshopApi {
    HttpWorkshopApi::new(&ClientConfig::new(base_url))
}

/// Records every notification posted to `/api/notifications`.
fn notifications_route(seen: Arc<Mutex<Vec<Value>>>, status: StatusCode) -> Router {
    Router::new().route(
        "/api/notifications",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(body);
                status
            }
        }),
    )
}

struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn create(&self, _notification: &NewNotification) -> atelier_core::Result<()> {
        Err(ClientError::Decode("notification store offline".to_string()))
    }
}

#[tokio::test]
async fn test_verify_expired_certificate() {
    let yesterday = (Utc::now() - chrono::Duration::days(1)).to_rfc3339();
    let app = Router::new().route(
        "/api/workshops/certificates/verify/{code}",
        get(move |Path(code): Path<String>| {
            let valid_until = yesterday.clone();
            async move {
                if code != "ABC123" {
                    return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "certificate": {
                            "id": "c1",
                            "workshopId": "w1",
                            "userId": "u1",
                            "verificationCode": "ABC123",
                            "isVerified": true,
                            "validUntil": valid_until
                        }
                    })),
                )
            }
        }),
    );
    let api = api_for(&serve(app).await);

    let result = api.verify_certificate("ABC123").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.outcome, VerificationOutcome::Expired);
    assert_eq!(result.error.as_deref(), Some(CERTIFICATE_EXPIRED));
    assert_eq!(result.certificate.unwrap().id, "c1");

    let missing = api.verify_certificate("NOPE").await.unwrap();
    assert!(!missing.is_valid);
    assert_eq!(missing.outcome, VerificationOutcome::NotFound);
    assert_eq!(missing.error.as_deref(), Some(CERTIFICATE_NOT_FOUND));
    assert!(missing.certificate.is_none());
}

#[tokio::test]
async fn test_enrollment_status_not_found_means_not_enrolled() {
    let app = Router::new().route(
        "/api/workshops/{id}/enrollment/{user}",
        get(|| async { StatusCode::NOT_FOUND }),
    );
    let api = api_for(&serve(app).await);

    let lookup = api.enrollment_status("w1", "u1").await.unwrap();
    assert!(!lookup.enrolled);
    assert!(lookup.status.is_none());
    assert!(lookup.enrollment.is_none());
}

#[tokio::test]
async fn test_enroll_conflict_maps_to_already_enrolled() {
    let app = Router::new().route(
        "/api/workshops/{id}/{user}/enroll",
        post(|| async { (StatusCode::CONFLICT, Json(json!({ "error": "duplicate" }))) }),
    );
    let api = api_for(&serve(app).await);

    let err = api.enroll("w1", "u1").await.unwrap_err();
    assert!(matches!(err, ClientError::AlreadyEnrolled));
    assert_eq!(err.to_string(), "You are already enrolled in this workshop");
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_error_detail_prefers_server_message() {
    let app = Router::new().route(
        "/api/workshops/{id}",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Title is required" })),
            )
        })
        .delete(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let api = api_for(&serve(app).await);

    let err = api
        .create_workshop("u1", &NewWorkshop::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to create workshop: Title is required");
    assert_eq!(err.status(), Some(400));

    let err = api.delete_workshop("w1").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to delete workshop: Internal Server Error");
}

#[tokio::test]
async fn test_enroll_succeeds_when_notifications_fail() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/api/workshops/{id}/{user}/enroll",
            post(|Path((id, user)): Path<(String, String)>| async move {
                Json(json!({
                    "enrollment": {
                        "id": "e1",
                        "workshopId": id,
                        "userId": user,
                        "workshopTitle": "Feature Engineering",
                        "status": "enrolled"
                    }
                }))
            }),
        )
        .route(
            "/api/workshops/{id}/enrollments",
            get(|Path(user): Path<String>| async move {
                Json(json!({
                    "enrollments": [{ "id": "e1", "workshopId": "w1", "userId": user, "status": "enrolled" }]
                }))
            }),
        )
        .merge(notifications_route(
            seen.clone(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ));
    let api = Arc::new(api_for(&serve(app).await));

    let enrollment = api.enroll("w1", "u1").await.unwrap().unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "notification was attempted");
        assert_eq!(seen[0]["userId"], "u1");
        assert_eq!(seen[0]["type"], NotificationKind::WorkshopEnrollment.as_str());
    }

    let session = SharedSession::signed_in(SessionUser::new("u2", "Lin"));
    let orchestrator = WorkshopOrchestrator::new(api, Arc::new(session));
    assert!(orchestrator.enroll_in_workshop("w1").await);
    let state = orchestrator.snapshot();
    assert!(state.enrollment_error.is_none());
    assert!(orchestrator.is_enrolled("w1"));
}

#[tokio::test]
async fn test_custom_sink_failure_is_swallowed() {
    let base_url = serve(Router::new().route(
        "/api/workshops/creators/approve",
        post(|| async { Json(json!({ "success": true })) }),
    ))
    .await;
    let api = HttpWorkshopApi::with_notifier(&ClientConfig::new(&base_url), Arc::new(FailingSink));

    api.approve_creator("u1", "admin").await.unwrap();
}

#[tokio::test]
async fn test_detail_is_normalized() {
    let app = Router::new().route(
        "/api/workshops/workshop/{id}",
        get(|| async {
            Json(json!({
                "workshop": {
                    "title": "Time Series Forecasting",
                    "date": { "_seconds": 1_735_725_600, "_nanoseconds": 0 },
                    "startTime": "10:00",
                    "enrolledCount": 3,
                    "maxParticipants": 25,
                    "status": "published",
                    "createdAt": { "_seconds": 1_735_000_000, "_nanoseconds": 500_000_000 }
                }
            }))
        }),
    );
    let api = api_for(&serve(app).await);

    let w = api.get_workshop_detail("w42").await.unwrap();
    assert_eq!(w.id, "w42");
    assert_eq!(w.date, "2025-01-01");
    assert_eq!(w.current_enrollments, 3);
    assert_eq!(w.status, WorkshopStatus::Published);
    assert_eq!(w.format, WorkshopFormat::Online);
    assert_eq!(w.duration, 120);
    assert_eq!(w.currency, "USD");
    assert_eq!(w.timezone, "UTC");
    assert!(w.auto_approve_enrollments);
    assert!(w.learning_objectives.is_empty());
    assert_eq!(w.created_at.as_deref(), Some("2024-12-24T00:26:40.500Z"));
}

#[tokio::test]
async fn test_listing_query_omits_status() {
    let captured: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let app = Router::new().route(
        "/api/workshops/{uid}/available",
        get({
            let captured = captured.clone();
            move |RawQuery(query): RawQuery| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = query;
                    Json(json!({
                        "workshops": [{ "id": "w1", "title": "Pandas", "status": "published" }],
                        "hasMore": false
                    }))
                }
            }
        }),
    );
    let api = api_for(&serve(app).await);

    let filters = WorkshopFilters {
        status: Some(WorkshopStatus::Published),
        search: Some("pandas".to_string()),
        limit: Some(10),
        ..Default::default()
    };
    let page = api.list_available("u1", &filters).await.unwrap();
    assert_eq!(page.workshops.len(), 1);
    assert_eq!(page.has_more, Some(false));

    let query = captured.lock().unwrap().clone().unwrap_or_default();
    assert!(query.contains("search=pandas"));
    assert!(query.contains("limit=10"));
    assert!(!query.contains("status"));
}

#[tokio::test]
async fn test_null_fields_and_unknown_status_still_decode() {
    let app = Router::new()
        .route(
            "/api/workshops/{uid}/available",
            get(|| async {
                Json(json!({
                    "workshops": [
                        { "id": "w1", "title": "Pandas", "status": "published" },
                        {
                            "id": "w2",
                            "title": "Polars",
                            "description": null,
                            "tags": null,
                            "currency": null,
                            "format": "classroom",
                            "status": "published"
                        }
                    ]
                }))
            }),
        )
        .route(
            "/api/workshops/workshop/{id}",
            get(|| async {
                Json(json!({
                    "workshop": { "title": "Legacy Spark", "status": "archived", "description": null }
                }))
            }),
        );
    let base_url = serve(app).await;
    let api = api_for(&base_url);

    let page = api.list_available("u1", &WorkshopFilters::default()).await.unwrap();
    assert_eq!(page.workshops.len(), 2);
    let polars = &page.workshops[1];
    assert_eq!(polars.description, "");
    assert!(polars.tags.is_empty());
    assert_eq!(polars.currency, "USD");
    assert_eq!(polars.format, WorkshopFormat::Online);

    let legacy = api.get_workshop_detail("w9").await.unwrap();
    assert_eq!(legacy.status, WorkshopStatus::Unknown("archived".to_string()));
    assert_eq!(legacy.status.as_str(), "archived");

    let orchestrator = WorkshopOrchestrator::new(
        Arc::new(api_for(&base_url)),
        Arc::new(SharedSession::signed_in(SessionUser::new("u1", "User u1"))),
    );
    assert!(orchestrator.fetch_workshops(WorkshopFilters::default()).await);
    let state = orchestrator.snapshot();
    assert_eq!(state.workshops.len(), 2);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_cancel_notifies_enrolled_and_waitlisted() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/api/workshops/{id}/cancel",
            post(|| async { Json(json!({ "success": true })) }),
        )
        .route(
            "/api/workshops/{id}/enrollments",
            get(|| async {
                Json(json!({
                    "enrollments": [
                        { "workshopId": "w1", "userId": "u2", "status": "enrolled" },
                        { "workshopId": "w1", "userId": "u3", "status": "waitlisted" },
                        { "workshopId": "w1", "userId": "u4", "status": "cancelled" },
                        { "workshopId": "w1", "userId": "creator", "status": "enrolled" }
                    ]
                }))
            }),
        )
        .merge(notifications_route(seen.clone(), StatusCode::CREATED));
    let api = api_for(&serve(app).await);

    let returned = api
        .cancel_workshop("w1", "creator", Some("Venue closed"))
        .await
        .unwrap();
    assert!(returned.is_none());

    let seen = seen.lock().unwrap();
    let mut recipients: Vec<&str> = seen.iter().filter_map(|n| n["userId"].as_str()).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["u2", "u3"]);
    assert!(seen
        .iter()
        .all(|n| n["type"] == "workshop_cancelled"
            && n["message"].as_str().unwrap().contains("Reason: Venue closed")));
}

#[tokio::test]
async fn test_download_returns_raw_bytes() {
    let app = Router::new().route(
        "/api/workshops/certificates/{id}/download",
        get(|| async { b"%PDF-1.7".to_vec() }),
    );
    let api = api_for(&serve(app).await);

    let bytes = api.download_certificate("c1").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7");
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use queuedesk_api::{app, worker::run_reminder_pass, AppState};
use async_trait::async_trait;
use queuedesk_core::{
    Booking, BookingQuery, BookingRepository, BookingStatus, EstimatorConfig, NewBooking, Notifier,
    QueueEstimator, RepoError,
};
use queuedesk_shared::{QueueAdvancedEvent, ReminderDueEvent};
use queuedesk_store::{EventNotifier, InMemoryBookingRepository, NotificationEvent};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    state: AppState,
    repo: Arc<InMemoryBookingRepository>,
    notifier: EventNotifier,
}

fn harness() -> Harness {
    let repo = Arc::new(InMemoryBookingRepository::new());
    let notifier = EventNotifier::new(16);
    let state = AppState {
        bookings: repo.clone(),
        notifier: Arc::new(notifier.clone()),
        estimator: Arc::new(QueueEstimator::new(EstimatorConfig::default()).unwrap()),
    };
    Harness { state, repo, notifier }
}

/// Reminder provider that is always down.
struct DownNotifier;

#[async_trait]
impl Notifier for DownNotifier {
    async fn send_reminder(&self, _event: &ReminderDueEvent) -> Result<(), RepoError> {
        Err("reminder provider unavailable".into())
    }

    async fn queue_advanced(&self, _event: &QueueAdvancedEvent) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Delegates to the in-memory store but refuses to start any booking.
struct NoStartRepository {
    inner: Arc<InMemoryBookingRepository>,
}

#[async_trait]
impl BookingRepository for NoStartRepository {
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, RepoError> {
        self.inner.create_booking(booking).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        self.inner.get_booking(id).await
    }

    async fn list_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, RepoError> {
        self.inner.list_bookings(query).await
    }

    async fn list_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<Booking>, RepoError> {
        self.inner.list_bookings_for_date(date).await
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, RepoError> {
        if status == BookingStatus::InProgress {
            return Err("connection reset".into());
        }
        self.inner.update_status(id, status).await
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, RepoError> {
        self.inner.mark_reminder_sent(id).await
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seed_reference_day(h: &Harness, business: Uuid) -> Vec<Booking> {
    let bookings = vec![
        Booking::queue_number(business, day(), 1, 20).with_status(BookingStatus::Completed),
        Booking::queue_number(business, day(), 2, 30).with_status(BookingStatus::InProgress),
        Booking::queue_number(business, day(), 3, 25),
    ];
    for b in &bookings {
        h.repo.insert(b.clone()).await;
    }
    bookings
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = app(h.state).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_queue_status_shape() {
    let h = harness();
    let business = Uuid::new_v4();
    seed_reference_day(&h, business).await;
    let router = app(h.state.clone());

    let (status, body) = send(&router, get(&format!("/v1/businesses/{}/queue?date=2024-06-01", business))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentServing"], 2);
    assert_eq!(body["totalQueue"], 2);
    assert_eq!(body["averageWaitTime"], 20.0);
    assert_eq!(body["resolved"]["completed"], 1);
    assert!(body["warning"].is_null());

    let queue = body["queue"].as_array().unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[1]["sequencePosition"], 3);
    assert_eq!(queue[1]["position"], 1);
    assert_eq!(queue[1]["estimatedWaitMinutes"], 20.0);
}

#[tokio::test]
async fn test_booking_position() {
    let h = harness();
    let business = Uuid::new_v4();
    let bookings = seed_reference_day(&h, business).await;
    let router = app(h.state.clone());

    let (status, body) = send(&router, get(&format!("/v1/bookings/{}/position", bookings[2].id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 1);
    assert_eq!(body["estimatedWaitMinutes"], 20.0);
    assert_eq!(body["currentServing"], 2);

    let (status, _) = send(&router, get(&format!("/v1/bookings/{}/position", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_corrupt_snapshot_is_bad_request() {
    let h = harness();
    let business = Uuid::new_v4();
    h.repo.insert(Booking::queue_number(business, day(), 4, 20)).await;
    h.repo.insert(Booking::queue_number(business, day(), 4, 20)).await;
    let router = app(h.state.clone());

    let (status, body) = send(&router, get(&format!("/v1/businesses/{}/queue?date=2024-06-01", business))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("duplicate sequence position 4"));
}

#[tokio::test]
async fn test_walk_in_flow() {
    let h = harness();
    let business = Uuid::new_v4();
    let router = app(h.state.clone());

    let mut ids = Vec::new();
    for name in ["Ren", "Mio"] {
        let (status, body) = send(
            &router,
            post_json(
                &format!("/v1/businesses/{}/bookings", business),
                json!({ "bookingDate": "2024-06-01", "serviceDurationMinutes": 15, "customerName": name }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        let (status, body) = send(
            &router,
            post_json(&format!("/v1/bookings/{}/status", id), json!({ "status": "CHECKED_IN" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CHECKED_IN");
    }

    let next_uri = format!("/v1/businesses/{}/queue/next?date=2024-06-01", business);

    let (status, body) = send(&router, post_json(&next_uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["completedBookingId"].is_null());
    assert_eq!(body["startedBookingId"], ids[0].as_str());
    assert_eq!(body["status"]["currentServing"], 1);

    let (_, body) = send(&router, post_json(&next_uri, json!({}))).await;
    assert_eq!(body["completedBookingId"], ids[0].as_str());
    assert_eq!(body["startedBookingId"], ids[1].as_str());
    assert_eq!(body["status"]["currentServing"], 2);
    assert_eq!(body["status"]["totalQueue"], 1);
    assert_eq!(body["status"]["averageWaitTime"], 15.0);
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let h = harness();
    let booking = Booking::queue_number(Uuid::new_v4(), day(), 1, 10);
    h.repo.insert(booking.clone()).await;
    let router = app(h.state.clone());

    let (status, _) = send(
        &router,
        post_json(&format!("/v1/bookings/{}/status", booking.id), json!({ "status": "COMPLETED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_queue_number_booking_requires_date() {
    let h = harness();
    let router = app(h.state.clone());

    let (status, _) = send(
        &router,
        post_json(
            &format!("/v1/businesses/{}/bookings", Uuid::new_v4()),
            json!({ "serviceDurationMinutes": 15 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reminders_sent_once() {
    let h = harness();
    let mut rx = h.notifier.subscribe();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let business = Uuid::new_v4();

    let due = Booking::time_slot(business, now + Duration::minutes(30), 30);
    let later = Booking::time_slot(business, now + Duration::minutes(90), 30);
    let cancelled =
        Booking::time_slot(business, now + Duration::minutes(28), 30).with_status(BookingStatus::Cancelled);
    for b in [&due, &later, &cancelled] {
        h.repo.insert(b.clone()).await;
    }

    assert_eq!(run_reminder_pass(&h.state, now).await.unwrap(), 1);
    // Next poll inside the same window must not send again
    assert_eq!(run_reminder_pass(&h.state, now + Duration::minutes(1)).await.unwrap(), 0);

    match rx.try_recv().unwrap() {
        NotificationEvent::ReminderDue(event) => {
            assert_eq!(event.booking_id, due.id);
            assert_eq!(event.minutes_until, 30);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(rx.try_recv().is_err());

    let stored = h.repo.get_booking(due.id).await.unwrap().unwrap();
    assert!(stored.reminder_sent);
}

#[tokio::test]
async fn test_reminder_window_crosses_midnight() {
    let h = harness();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 23, 50, 0).unwrap();
    let booking = Booking::time_slot(Uuid::new_v4(), now + Duration::minutes(30), 30);
    assert_eq!(booking.booking_date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    h.repo.insert(booking).await;

    assert_eq!(run_reminder_pass(&h.state, now).await.unwrap(), 1);
}

#[tokio::test]
async fn test_long_reminder_window_reaches_next_day() {
    let repo = Arc::new(InMemoryBookingRepository::new());
    let config = EstimatorConfig {
        reminder_window_minutes: 20 * 60,
        ..EstimatorConfig::default()
    };
    let state = AppState {
        bookings: repo.clone(),
        notifier: Arc::new(EventNotifier::new(16)),
        estimator: Arc::new(QueueEstimator::new(config).unwrap()),
    };
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap();
    let early = Booking::time_slot(Uuid::new_v4(), Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap(), 30);
    let too_far = Booking::time_slot(Uuid::new_v4(), Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap(), 30);
    repo.insert(early.clone()).await;
    repo.insert(too_far.clone()).await;

    assert_eq!(run_reminder_pass(&state, now).await.unwrap(), 1);
    assert!(repo.get_booking(early.id).await.unwrap().unwrap().reminder_sent);
    assert!(!repo.get_booking(too_far.id).await.unwrap().unwrap().reminder_sent);
}

#[tokio::test]
async fn test_failed_reminder_dispatch_is_not_retried() {
    let repo = Arc::new(InMemoryBookingRepository::new());
    let state = AppState {
        bookings: repo.clone(),
        notifier: Arc::new(DownNotifier),
        estimator: Arc::new(QueueEstimator::new(EstimatorConfig::default()).unwrap()),
    };
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let booking = Booking::time_slot(Uuid::new_v4(), now + Duration::minutes(30), 30);
    repo.insert(booking.clone()).await;

    // Dispatch fails, so nothing counts as sent
    assert_eq!(run_reminder_pass(&state, now).await.unwrap(), 0);
    // ...but the claim stays, keeping delivery at most once
    let stored = repo.get_booking(booking.id).await.unwrap().unwrap();
    assert!(stored.reminder_sent);
    assert_eq!(run_reminder_pass(&state, now + Duration::minutes(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_advance_reports_half_advanced_queue() {
    let inner = Arc::new(InMemoryBookingRepository::new());
    let notifier = EventNotifier::new(16);
    let mut rx = notifier.subscribe();
    let state = AppState {
        bookings: Arc::new(NoStartRepository { inner: inner.clone() }),
        notifier: Arc::new(notifier),
        estimator: Arc::new(QueueEstimator::new(EstimatorConfig::default()).unwrap()),
    };
    let business = Uuid::new_v4();
    let serving = Booking::queue_number(business, day(), 1, 15).with_status(BookingStatus::InProgress);
    let waiting = Booking::queue_number(business, day(), 2, 15).with_status(BookingStatus::CheckedIn);
    inner.insert(serving.clone()).await;
    inner.insert(waiting.clone()).await;
    let router = app(state);

    let (status, _) = send(
        &router,
        post_json(&format!("/v1/businesses/{}/queue/next?date=2024-06-01", business), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    match rx.try_recv().unwrap() {
        NotificationEvent::QueueAdvanced(event) => {
            assert_eq!(event.completed_booking_id, Some(serving.id));
            assert_eq!(event.started_booking_id, None);
            assert_eq!(event.now_serving, None);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let completed = inner.get_booking(serving.id).await.unwrap().unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    let still_waiting = inner.get_booking(waiting.id).await.unwrap().unwrap();
    assert_eq!(still_waiting.status, BookingStatus::CheckedIn);
}

#[tokio::test]
async fn test_zero_duration_booking_is_rejected() {
    let h = harness();
    let router = app(h.state.clone());

    let (status, body) = send(
        &router,
        post_json(
            &format!("/v1/businesses/{}/bookings", Uuid::new_v4()),
            json!({ "bookingDate": "2024-06-01", "serviceDurationMinutes": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("service duration must be positive"));
    assert!(!message.contains(&Uuid::nil().to_string()));
}

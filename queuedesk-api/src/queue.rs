use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use queuedesk_core::{
    estimate_queue_position, next_in_line, BookingQuery, BookingStatus, QueueStatus,
};
use queuedesk_shared::QueueAdvancedEvent;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueParams {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Absent selects the business's shared queue.
    pub staff_id: Option<Uuid>,
}

impl QueueParams {
    fn query(&self, business_id: Uuid) -> BookingQuery {
        BookingQuery {
            business_id,
            booking_date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
            staff_id: self.staff_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub booking_id: Uuid,
    pub position: u32,
    pub estimated_wait_minutes: f64,
    pub current_serving: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub completed_booking_id: Option<Uuid>,
    pub started_booking_id: Option<Uuid>,
    pub status: QueueStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/businesses/{business_id}/queue", get(get_queue_status))
        .route("/v1/businesses/{business_id}/queue/next", post(advance_queue))
        .route("/v1/bookings/{booking_id}/position", get(get_booking_position))
}

/// GET /v1/businesses/{business_id}/queue
async fn get_queue_status(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    Query(params): Query<QueueParams>,
) -> Result<Json<QueueStatus>, AppError> {
    let bookings = state.bookings.list_bookings(&params.query(business_id)).await?;
    let status = state.estimator.compute_queue_status(&bookings, Utc::now())?;
    Ok(Json(status))
}

/// GET /v1/bookings/{booking_id}/position
async fn get_booking_position(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PositionResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("booking {} not found", booking_id)))?;

    let query = BookingQuery {
        business_id: booking.business_id,
        booking_date: booking.booking_date,
        staff_id: booking.staff_id,
    };
    let snapshot = state.bookings.list_bookings(&query).await?;
    let status = state.estimator.compute_queue_status(&snapshot, Utc::now())?;
    let estimate = estimate_queue_position(&booking, status.current_serving, status.average_wait_time)?;

    Ok(Json(PositionResponse {
        booking_id,
        position: estimate.position,
        estimated_wait_minutes: estimate.estimated_wait_minutes,
        current_serving: status.current_serving,
    }))
}

/// POST /v1/businesses/{business_id}/queue/next
/// Finish whoever is being served and call the next checked-in customer.
async fn advance_queue(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    Query(params): Query<QueueParams>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let query = params.query(business_id);
    let bookings = state.bookings.list_bookings(&query).await?;
    let before = state.estimator.compute_queue_status(&bookings, Utc::now())?;

    let serving = before.current_serving.and_then(|seq| {
        bookings
            .iter()
            .find(|b| b.status == BookingStatus::InProgress && b.sequence_position == Some(seq))
    });
    let completed_booking_id = match serving {
        Some(booking) => {
            state.bookings.update_status(booking.id, BookingStatus::Completed).await?;
            Some(booking.id)
        }
        None => None,
    };

    let started_booking_id = match next_in_line(&bookings) {
        Some(booking) => match state.bookings.update_status(booking.id, BookingStatus::InProgress).await {
            Ok(_) => Some(booking.id),
            Err(e) => {
                if completed_booking_id.is_some() {
                    // Current customer is already completed; report the half-advanced queue
                    error!(
                        %business_id,
                        ?completed_booking_id,
                        next_booking_id = %booking.id,
                        "Completed current booking but failed to start the next: {}",
                        e
                    );
                    publish_advance(&state, &query, completed_booking_id, None, None).await;
                }
                return Err(e.into());
            }
        },
        None => None,
    };

    let refreshed = state.bookings.list_bookings(&query).await?;
    let status = state.estimator.compute_queue_status(&refreshed, Utc::now())?;

    info!(
        %business_id,
        now_serving = ?status.current_serving,
        remaining = status.total_queue,
        "Queue advanced"
    );

    publish_advance(
        &state,
        &query,
        completed_booking_id,
        started_booking_id,
        status.current_serving,
    )
    .await;

    Ok(Json(AdvanceResponse {
        completed_booking_id,
        started_booking_id,
        status,
    }))
}

async fn publish_advance(
    state: &AppState,
    query: &BookingQuery,
    completed_booking_id: Option<Uuid>,
    started_booking_id: Option<Uuid>,
    now_serving: Option<u32>,
) {
    let event = QueueAdvancedEvent {
        business_id: query.business_id,
        staff_id: query.staff_id,
        completed_booking_id,
        started_booking_id,
        now_serving,
        timestamp: Utc::now().timestamp(),
    };
    if let Err(e) = state.notifier.queue_advanced(&event).await {
        error!("Failed to publish queue advance: {}", e);
    }
}

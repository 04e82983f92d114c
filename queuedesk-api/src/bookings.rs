use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use queuedesk_core::{Booking, BookingStatus, NewBooking};
use queuedesk_shared::Masked;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub staff_id: Option<Uuid>,
    /// Required for queue-number bookings, derived from `scheduled_time` otherwise.
    pub booking_date: Option<NaiveDate>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub service_duration_minutes: i32,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/businesses/{business_id}/bookings", post(create_booking))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/status", post(update_status))
}

/// POST /v1/businesses/{business_id}/bookings
async fn create_booking(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking_date = match (req.booking_date, req.scheduled_time) {
        (Some(date), _) => date,
        (None, Some(at)) => at.date_naive(),
        (None, None) => {
            return Err(AppError::ValidationError(
                "bookingDate is required for queue-number bookings".to_string(),
            ))
        }
    };

    let booking = state
        .bookings
        .create_booking(NewBooking {
            business_id,
            staff_id: req.staff_id,
            booking_date,
            scheduled_time: req.scheduled_time,
            service_duration_minutes: req.service_duration_minutes,
            customer_name: req.customer_name,
            customer_contact: req.customer_contact.map(Masked),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/{booking_id}
async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    state
        .bookings
        .get_booking(booking_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("booking {} not found", booking_id)))
}

/// POST /v1/bookings/{booking_id}/status
async fn update_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.update_status(booking_id, req.status).await?;
    info!(%booking_id, status = %booking.status, "Booking status updated");
    Ok(Json(booking))
}

use chrono::{DateTime, NaiveDate, Utc};
use queuedesk_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult, ValidationError};

/// Booking lifecycle.
///
/// `CONFIRMED → CHECKED_IN → IN_PROGRESS → COMPLETED` is the happy path,
/// with `CANCELLED` (from `CONFIRMED`) and `NO_SHOW` (from `CONFIRMED` or
/// `CHECKED_IN`) as the alternate terminal states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Still occupies a place in the queue.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::CheckedIn | BookingStatus::InProgress
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Confirmed, CheckedIn)
                | (CheckedIn, InProgress)
                | (InProgress, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (CheckedIn, NoShow)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::CheckedIn => "CHECKED_IN",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking as read from storage. The estimator never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub booking_date: NaiveDate,
    /// Queue number, `None` for time-slot bookings.
    pub sequence_position: Option<u32>,
    /// Fixed clock time, `None` for pure queue-number bookings.
    pub scheduled_time: Option<DateTime<Utc>>,
    pub service_duration_minutes: i32,
    pub status: BookingStatus,
    pub reminder_sent: bool,
    pub customer_name: Option<String>,
    pub customer_contact: Option<Masked<String>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Walk-in style booking served in arrival order.
    pub fn queue_number(
        business_id: Uuid,
        booking_date: NaiveDate,
        sequence_position: u32,
        service_duration_minutes: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            staff_id: None,
            booking_date,
            sequence_position: Some(sequence_position),
            scheduled_time: None,
            service_duration_minutes,
            status: BookingStatus::Confirmed,
            reminder_sent: false,
            customer_name: None,
            customer_contact: None,
            created_at: Utc::now(),
        }
    }

    /// Booking pinned to a clock time.
    pub fn time_slot(
        business_id: Uuid,
        scheduled_time: DateTime<Utc>,
        service_duration_minutes: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            staff_id: None,
            booking_date: scheduled_time.date_naive(),
            sequence_position: None,
            scheduled_time: Some(scheduled_time),
            service_duration_minutes,
            status: BookingStatus::Confirmed,
            reminder_sent: false,
            customer_name: None,
            customer_contact: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_staff(mut self, staff_id: Uuid) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    /// Apply a lifecycle transition, rejecting anything the state machine forbids.
    pub fn transition(&mut self, next: BookingStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Intake request. The store assigns `id`, `created_at` and, for bookings
/// without a `scheduled_time`, the next sequence position of the grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub booking_date: NaiveDate,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub service_duration_minutes: i32,
    pub customer_name: Option<String>,
    pub customer_contact: Option<Masked<String>>,
}

impl NewBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_duration_minutes <= 0 {
            return Err(ValidationError::InvalidDuration(self.service_duration_minutes));
        }
        if let Some(at) = self.scheduled_time {
            if at.date_naive() != self.booking_date {
                return Err(ValidationError::ScheduleDateMismatch {
                    booking_date: self.booking_date,
                    scheduled_date: at.date_naive(),
                });
            }
        }
        Ok(())
    }
}

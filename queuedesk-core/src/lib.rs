pub mod booking;
pub mod config;
pub mod estimator;
pub mod reminder;
pub mod repository;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use config::EstimatorConfig;
pub use estimator::{
    estimate_queue_position, next_in_line, ConsistencyWarning, QueueEntry, QueueEstimator,
    QueuePosition, QueueStatus, ResolvedCounts,
};
pub use reminder::{due_reminders, is_within_reminder_window, ReminderWindow, MAX_REMINDER_LEAD_MINUTES};
pub use repository::{BookingQuery, BookingRepository, Notifier, RepoError};

use chrono::NaiveDate;
use uuid::Uuid;

/// Malformed input handed to the estimator or the booking store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate sequence position {0}")]
    DuplicateSequencePosition(u32),
    #[error("booking {booking_id} has non-positive service duration {minutes}")]
    NonPositiveDuration { booking_id: Uuid, minutes: i32 },
    #[error("bookings span more than one business/date/staff grouping")]
    MixedGrouping,
    #[error("booking {0} has no sequence position")]
    MissingSequencePosition(Uuid),
    #[error("service duration must be positive, got {0} minutes")]
    InvalidDuration(i32),
    #[error("scheduled time falls on {scheduled_date}, not on booking date {booking_date}")]
    ScheduleDateMismatch {
        booking_date: NaiveDate,
        scheduled_date: NaiveDate,
    },
    #[error("invalid estimator configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

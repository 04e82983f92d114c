use async_trait::async_trait;
use chrono::NaiveDate;
use queuedesk_shared::{QueueAdvancedEvent, ReminderDueEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, NewBooking};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Selects one queue: a business's bookings for a day, either for one staff
/// member or for the shared queue (`staff_id == None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingQuery {
    pub business_id: Uuid,
    pub booking_date: NaiveDate,
    pub staff_id: Option<Uuid>,
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        booking.business_id == self.business_id
            && booking.booking_date == self.booking_date
            && booking.staff_id == self.staff_id
    }
}

/// Repository trait for booking snapshots
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking, assigning the next sequence position of its grouping
    /// when it has no scheduled time.
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, RepoError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;

    async fn list_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, RepoError>;

    /// Every booking on `date`, across businesses. Used by the reminder worker.
    async fn list_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<Booking>, RepoError>;

    /// Transition a booking's status, enforcing the lifecycle state machine.
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, RepoError>;

    /// Flip `reminder_sent` to true. Returns `false` if it was already set,
    /// in which case the caller must not send another reminder.
    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// Outbound customer notifications (LINE, email, SMS providers live behind this).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, event: &ReminderDueEvent) -> Result<(), RepoError>;

    async fn queue_advanced(&self, event: &QueueAdvancedEvent) -> Result<(), RepoError>;
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::pii::Masked;

/// Emitted by the reminder worker once a booking enters its reminder window
/// and its `reminder_sent` flag has been claimed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReminderDueEvent {
    pub booking_id: Uuid,
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<Masked<String>>,
    pub scheduled_time: DateTime<Utc>,
    pub minutes_until: i64,
    pub timestamp: i64,
}

/// Emitted when the front desk calls the next customer.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QueueAdvancedEvent {
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub completed_booking_id: Option<Uuid>,
    pub started_booking_id: Option<Uuid>,
    pub now_serving: Option<u32>,
    pub timestamp: i64,
}

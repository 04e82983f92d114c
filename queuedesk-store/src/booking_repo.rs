use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use queuedesk_core::{
    Booking, BookingQuery, BookingRepository, BookingStatus, CoreError, NewBooking, RepoError,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    bookings: HashMap<Uuid, Booking>,
    /// Last sequence position handed out per business/date/staff queue.
    sequences: HashMap<BookingQuery, u32>,
}

/// In-memory booking store. Sequence assignment and the reminder flag
/// compare-and-set both run under the write lock.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    inner: RwLock<Inner>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an existing booking as-is, keeping its sequence position.
    pub async fn insert(&self, booking: Booking) {
        let mut inner = self.inner.write().await;
        if let Some(seq) = booking.sequence_position {
            let key = grouping_of(&booking);
            let last = inner.sequences.entry(key).or_insert(0);
            *last = (*last).max(seq);
        }
        inner.bookings.insert(booking.id, booking);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.bookings.len()
    }
}

fn grouping_of(booking: &Booking) -> BookingQuery {
    BookingQuery {
        business_id: booking.business_id,
        booking_date: booking.booking_date,
        staff_id: booking.staff_id,
    }
}

fn queue_order(bookings: &mut [Booking]) {
    bookings.sort_by_key(|b| (b.sequence_position.is_none(), b.sequence_position, b.scheduled_time));
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create_booking(&self, new: NewBooking) -> Result<Booking, RepoError> {
        new.validate().map_err(CoreError::from)?;

        let mut inner = self.inner.write().await;
        let key = BookingQuery {
            business_id: new.business_id,
            booking_date: new.booking_date,
            staff_id: new.staff_id,
        };

        let sequence_position = match new.scheduled_time {
            Some(_) => None,
            None => {
                let last = inner.sequences.entry(key).or_insert(0);
                *last += 1;
                Some(*last)
            }
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            business_id: new.business_id,
            staff_id: new.staff_id,
            booking_date: new.booking_date,
            sequence_position,
            scheduled_time: new.scheduled_time,
            service_duration_minutes: new.service_duration_minutes,
            status: BookingStatus::Confirmed,
            reminder_sent: false,
            customer_name: new.customer_name,
            customer_contact: new.customer_contact,
            created_at: Utc::now(),
        };
        inner.bookings.insert(booking.id, booking.clone());

        info!(
            booking_id = %booking.id,
            business_id = %booking.business_id,
            sequence_position = ?booking.sequence_position,
            "booking created"
        );
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        Ok(self.inner.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, RepoError> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        queue_order(&mut bookings);
        Ok(bookings)
    }

    async fn list_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<Booking>, RepoError> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.booking_date == date)
            .cloned()
            .collect();
        queue_order(&mut bookings);
        Ok(bookings)
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, RepoError> {
        let mut inner = self.inner.write().await;
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", id)))?;

        let from = booking.status;
        booking.transition(status)?;
        debug!(booking_id = %id, %from, to = %status, "booking status changed");
        Ok(booking.clone())
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut inner = self.inner.write().await;
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", id)))?;

        if booking.reminder_sent {
            return Ok(false);
        }
        booking.reminder_sent = true;
        Ok(true)
    }
}

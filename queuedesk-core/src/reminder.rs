use chrono::{DateTime, Duration, Utc};

use crate::booking::Booking;

/// Longest reminder lead time accepted. The reminder worker scans bookings
/// from today through the day this lead reaches.
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 24 * 60;

/// Target lead time before a scheduled booking, with a tolerance band on
/// either side so a periodic poller does not miss it between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub window_minutes: i64,
    pub tolerance_minutes: i64,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            window_minutes: 30,
            tolerance_minutes: 5,
        }
    }
}

impl ReminderWindow {
    fn bounds_seconds(&self) -> (i64, i64) {
        let lower = self
            .window_minutes
            .saturating_sub(self.tolerance_minutes)
            .saturating_mul(60);
        let upper = self
            .window_minutes
            .saturating_add(self.tolerance_minutes)
            .saturating_mul(60);
        (lower, upper)
    }

    /// Furthest ahead of `now` a due booking can be, capped at
    /// `MAX_REMINDER_LEAD_MINUTES`.
    pub fn max_lead(&self) -> Duration {
        let minutes = self
            .window_minutes
            .saturating_add(self.tolerance_minutes)
            .clamp(0, MAX_REMINDER_LEAD_MINUTES);
        Duration::minutes(minutes)
    }
}

/// Whether `booking` is due for its one-time reminder at `now`.
///
/// Both band edges are inclusive. Queue-number bookings (no scheduled time)
/// and bookings whose reminder already went out are never due.
pub fn is_within_reminder_window(
    booking: &Booking,
    now: DateTime<Utc>,
    window: ReminderWindow,
) -> bool {
    if booking.reminder_sent {
        return false;
    }
    let Some(scheduled) = booking.scheduled_time else {
        return false;
    };

    let until = (scheduled - now).num_seconds();
    let (lower, upper) = window.bounds_seconds();
    (lower..=upper).contains(&until)
}

/// Active bookings that should get a reminder now, earliest first.
pub fn due_reminders<'a>(
    bookings: &'a [Booking],
    now: DateTime<Utc>,
    window: ReminderWindow,
) -> Vec<&'a Booking> {
    let mut due: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.status.is_active())
        .filter(|b| is_within_reminder_window(b, now, window))
        .collect();
    due.sort_by_key(|b| b.scheduled_time);
    due
}

use chrono::{DateTime, Utc};
use queuedesk_core::RepoError;
use queuedesk_shared::ReminderDueEvent;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Poll today's bookings on a fixed interval and dispatch due reminders.
pub async fn start_reminder_worker(state: AppState, poll: Duration) {
    let mut ticker = interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Reminder worker started, polling every {:?}", poll);

    loop {
        ticker.tick().await;
        match run_reminder_pass(&state, Utc::now()).await {
            Ok(0) => debug!("No reminders due"),
            Ok(sent) => info!("Dispatched {} reminders", sent),
            Err(e) => error!("Reminder pass failed: {}", e),
        }
    }
}

/// One scan. Returns how many reminders were handed to the notifier.
///
/// The `reminder_sent` flag is claimed before dispatch, so a failed dispatch
/// is not retried: reminders are at-most-once.
pub async fn run_reminder_pass(state: &AppState, now: DateTime<Utc>) -> Result<usize, RepoError> {
    // The window can reach past midnight, so scan every day up to its far edge
    let last_day = now
        .checked_add_signed(state.estimator.reminder_window().max_lead())
        .map(|t| t.date_naive())
        .unwrap_or_else(|| now.date_naive());

    let mut bookings = Vec::new();
    let mut day = now.date_naive();
    loop {
        bookings.extend(state.bookings.list_bookings_for_date(day).await?);
        match day.succ_opt() {
            Some(next) if next <= last_day => day = next,
            _ => break,
        }
    }

    let mut sent = 0;
    for booking in state.estimator.due_reminders(&bookings, now) {
        let Some(scheduled_time) = booking.scheduled_time else {
            continue;
        };

        if !state.bookings.mark_reminder_sent(booking.id).await? {
            debug!(booking_id = %booking.id, "Reminder already claimed, skipping");
            continue;
        }

        let event = ReminderDueEvent {
            booking_id: booking.id,
            business_id: booking.business_id,
            staff_id: booking.staff_id,
            customer_name: booking.customer_name.clone(),
            customer_contact: booking.customer_contact.clone(),
            scheduled_time,
            minutes_until: (scheduled_time - now).num_minutes(),
            timestamp: now.timestamp(),
        };

        match state.notifier.send_reminder(&event).await {
            Ok(()) => sent += 1,
            Err(e) => error!(booking_id = %booking.id, "Failed to send reminder: {}", e),
        }
    }

    Ok(sent)
}

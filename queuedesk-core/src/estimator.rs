use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::config::EstimatorConfig;
use crate::reminder::{self, ReminderWindow};
use crate::{CoreResult, ValidationError};

/// Derived view of one business/date/staff queue at `computed_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub current_serving: Option<u32>,
    pub total_queue: usize,
    pub average_wait_time: f64,
    pub queue: Vec<QueueEntry>,
    pub resolved: ResolvedCounts,
    pub warning: Option<ConsistencyWarning>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub booking_id: Uuid,
    pub sequence_position: Option<u32>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    /// `None` for time-slot bookings, which are not served by queue number.
    pub position: Option<u32>,
    pub estimated_wait_minutes: Option<f64>,
    pub minutes_until_scheduled: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCounts {
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
}

/// Inconsistent data from storage that the estimator tolerates but the
/// caller should log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConsistencyWarning {
    #[serde(rename_all = "camelCase")]
    MultipleInProgress { positions: Vec<u32>, chosen: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePosition {
    pub position: u32,
    pub estimated_wait_minutes: f64,
}

impl QueuePosition {
    pub const NOW: QueuePosition = QueuePosition {
        position: 0,
        estimated_wait_minutes: 0.0,
    };
}

/// Stateless queue calculator. Every call works on the snapshot it is given.
#[derive(Debug, Clone)]
pub struct QueueEstimator {
    config: EstimatorConfig,
}

impl QueueEstimator {
    pub fn new(config: EstimatorConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn reminder_window(&self) -> ReminderWindow {
        self.config.reminder_window()
    }

    /// Summarise one day's bookings for a single queue grouping.
    pub fn compute_queue_status(
        &self,
        bookings: &[Booking],
        now: DateTime<Utc>,
    ) -> CoreResult<QueueStatus> {
        validate_snapshot(bookings)?;

        let mut resolved = ResolvedCounts::default();
        let mut completed_minutes: Vec<i32> = Vec::new();
        let mut in_progress: Vec<u32> = Vec::new();
        let mut active: Vec<&Booking> = Vec::new();

        for booking in bookings {
            match booking.status {
                BookingStatus::Completed => {
                    resolved.completed += 1;
                    completed_minutes.push(booking.service_duration_minutes);
                }
                BookingStatus::Cancelled => resolved.cancelled += 1,
                BookingStatus::NoShow => resolved.no_show += 1,
                BookingStatus::InProgress => {
                    if let Some(seq) = booking.sequence_position {
                        in_progress.push(seq);
                    }
                    active.push(booking);
                }
                BookingStatus::Confirmed | BookingStatus::CheckedIn => active.push(booking),
            }
        }

        in_progress.sort_unstable();
        let current_serving = in_progress.first().copied();
        let warning = match current_serving {
            Some(chosen) if in_progress.len() > 1 => {
                warn!(
                    positions = ?in_progress,
                    chosen,
                    "multiple bookings IN_PROGRESS in one queue, serving the lowest position"
                );
                Some(ConsistencyWarning::MultipleInProgress {
                    positions: in_progress.clone(),
                    chosen,
                })
            }
            _ => None,
        };

        let average_wait_time = if completed_minutes.is_empty() {
            f64::from(self.config.default_service_duration_minutes)
        } else {
            let total: i64 = completed_minutes.iter().map(|m| i64::from(*m)).sum();
            total as f64 / completed_minutes.len() as f64
        };

        // Numbered bookings first, then time slots by clock time.
        active.sort_by_key(|b| (b.sequence_position.is_none(), b.sequence_position, b.scheduled_time));

        let mut queue = Vec::with_capacity(active.len());
        for booking in &active {
            let estimate = match booking.sequence_position {
                Some(_) => Some(estimate_queue_position(booking, current_serving, average_wait_time)?),
                None => None,
            };
            queue.push(QueueEntry {
                booking_id: booking.id,
                sequence_position: booking.sequence_position,
                scheduled_time: booking.scheduled_time,
                status: booking.status,
                position: estimate.map(|e| e.position),
                estimated_wait_minutes: estimate.map(|e| e.estimated_wait_minutes),
                minutes_until_scheduled: booking.scheduled_time.map(|at| (at - now).num_minutes()),
            });
        }

        debug!(
            total = bookings.len(),
            active = active.len(),
            ?current_serving,
            average_wait_time,
            "computed queue status"
        );

        Ok(QueueStatus {
            current_serving,
            total_queue: active.len(),
            average_wait_time,
            queue,
            resolved,
            warning,
            computed_at: now,
        })
    }

    pub fn is_within_reminder_window(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        reminder::is_within_reminder_window(booking, now, self.reminder_window())
    }

    pub fn due_reminders<'a>(&self, bookings: &'a [Booking], now: DateTime<Utc>) -> Vec<&'a Booking> {
        reminder::due_reminders(bookings, now, self.reminder_window())
    }
}

/// Linear wait estimate: places ahead times the average service time.
///
/// Ignores the individual durations of the bookings ahead.
pub fn estimate_queue_position(
    booking: &Booking,
    current_serving: Option<u32>,
    average_wait_time: f64,
) -> CoreResult<QueuePosition> {
    let seq = booking
        .sequence_position
        .ok_or(ValidationError::MissingSequencePosition(booking.id))?;

    if booking.status.is_terminal() {
        return Ok(QueuePosition::NOW);
    }

    let position = match current_serving {
        Some(serving) if seq <= serving => 0,
        Some(serving) => seq - serving,
        None => seq,
    };
    let estimated_wait_minutes = (f64::from(position) * average_wait_time).max(0.0);

    Ok(QueuePosition {
        position,
        estimated_wait_minutes,
    })
}

/// The checked-in queue-number booking that should be called next.
pub fn next_in_line(bookings: &[Booking]) -> Option<&Booking> {
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::CheckedIn)
        .filter_map(|b| b.sequence_position.map(|seq| (seq, b)))
        .min_by_key(|(seq, _)| *seq)
        .map(|(_, b)| b)
}

fn validate_snapshot(bookings: &[Booking]) -> Result<(), ValidationError> {
    let Some(first) = bookings.first() else {
        return Ok(());
    };
    let grouping = (first.business_id, first.booking_date, first.staff_id);

    let mut seen = HashSet::with_capacity(bookings.len());
    for booking in bookings {
        if (booking.business_id, booking.booking_date, booking.staff_id) != grouping {
            return Err(ValidationError::MixedGrouping);
        }
        if booking.service_duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                booking_id: booking.id,
                minutes: booking.service_duration_minutes,
            });
        }
        if let Some(seq) = booking.sequence_position {
            if !seen.insert(seq) {
                return Err(ValidationError::DuplicateSequencePosition(seq));
            }
        }
    }
    Ok(())
}

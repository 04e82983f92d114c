use serde::{Deserialize, Serialize};

use crate::reminder::{ReminderWindow, MAX_REMINDER_LEAD_MINUTES};
use crate::ValidationError;

/// Tunables for queue estimation and reminder timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimatorConfig {
    #[serde(default = "default_reminder_window")]
    pub reminder_window_minutes: i64,
    #[serde(default = "default_reminder_tolerance")]
    pub reminder_tolerance_minutes: i64,
    /// Used as the average service time until the first booking of the day completes.
    #[serde(default = "default_service_duration")]
    pub default_service_duration_minutes: u32,
}

fn default_reminder_window() -> i64 { 30 }
fn default_reminder_tolerance() -> i64 { 5 }
fn default_service_duration() -> u32 { 30 }

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            reminder_window_minutes: default_reminder_window(),
            reminder_tolerance_minutes: default_reminder_tolerance(),
            default_service_duration_minutes: default_service_duration(),
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reminder_window_minutes <= 0 {
            return Err(ValidationError::InvalidConfig(format!(
                "reminder_window_minutes must be positive, got {}",
                self.reminder_window_minutes
            )));
        }
        if self.reminder_tolerance_minutes < 0 {
            return Err(ValidationError::InvalidConfig(format!(
                "reminder_tolerance_minutes must not be negative, got {}",
                self.reminder_tolerance_minutes
            )));
        }
        if self.reminder_window_minutes > MAX_REMINDER_LEAD_MINUTES {
            return Err(ValidationError::InvalidConfig(format!(
                "reminder_window_minutes must not exceed {}, got {}",
                MAX_REMINDER_LEAD_MINUTES, self.reminder_window_minutes
            )));
        }
        if self.reminder_tolerance_minutes > self.reminder_window_minutes {
            return Err(ValidationError::InvalidConfig(
                "reminder_tolerance_minutes exceeds reminder_window_minutes".to_string(),
            ));
        }
        if self.reminder_window_minutes + self.reminder_tolerance_minutes > MAX_REMINDER_LEAD_MINUTES {
            return Err(ValidationError::InvalidConfig(format!(
                "reminder window plus tolerance must not exceed {} minutes",
                MAX_REMINDER_LEAD_MINUTES
            )));
        }
        if self.default_service_duration_minutes == 0 {
            return Err(ValidationError::InvalidConfig(
                "default_service_duration_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reminder_window(&self) -> ReminderWindow {
        ReminderWindow {
            window_minutes: self.reminder_window_minutes,
            tolerance_minutes: self.reminder_tolerance_minutes,
        }
    }
}

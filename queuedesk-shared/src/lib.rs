pub mod models;
pub mod pii;

pub use models::events::{QueueAdvancedEvent, ReminderDueEvent};
pub use pii::Masked;

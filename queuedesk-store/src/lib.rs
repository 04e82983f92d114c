pub mod app_config;
pub mod booking_repo;
pub mod notifier;

pub use booking_repo::InMemoryBookingRepository;
pub use notifier::{EventNotifier, NotificationEvent};

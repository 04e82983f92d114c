use queuedesk_core::{BookingRepository, Notifier, QueueEstimator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub estimator: Arc<QueueEstimator>,
}

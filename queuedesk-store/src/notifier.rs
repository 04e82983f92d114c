use async_trait::async_trait;
use queuedesk_core::{Notifier, RepoError};
use queuedesk_shared::{QueueAdvancedEvent, ReminderDueEvent};
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    ReminderDue(ReminderDueEvent),
    QueueAdvanced(QueueAdvancedEvent),
}

/// Logs outbound notifications and fans them out on a broadcast channel.
///
/// Provider integrations (LINE, email, SMS) subscribe to the channel; having
/// no subscriber is not an error.
#[derive(Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<NotificationEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            debug!("No notification subscribers, event dropped");
        }
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn send_reminder(&self, event: &ReminderDueEvent) -> Result<(), RepoError> {
        info!(
            booking_id = %event.booking_id,
            business_id = %event.business_id,
            minutes_until = event.minutes_until,
            contact = ?event.customer_contact,
            "Reminder dispatched"
        );
        self.publish(NotificationEvent::ReminderDue(event.clone()));
        Ok(())
    }

    async fn queue_advanced(&self, event: &QueueAdvancedEvent) -> Result<(), RepoError> {
        info!(
            business_id = %event.business_id,
            now_serving = ?event.now_serving,
            "Queue advanced"
        );
        self.publish(NotificationEvent::QueueAdvanced(event.clone()));
        Ok(())
    }
}

//! Core event bus: broadcasts state changes to observers (UI, CLI).

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::message::Message;
use super::notification::Notification;

/// Default buffered events per subscriber before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A state change in one of the core structures.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoreEvent {
    MessageAppended { message: Message },
    HistoryCleared,
    NotificationPushed { notification: Notification },
    NotificationDismissed { id: String },
    BusyChanged { busy: bool },
}

/// Broadcast bus shared by the engine and the notification queue.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<CoreEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: CoreEvent) {
        if self.sender.receiver_count() > 0 {
            let _ = self.sender.send(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(CoreEvent::BusyChanged { busy: true });

        assert!(matches!(rx1.recv().await.unwrap(), CoreEvent::BusyChanged { busy: true }));
        assert!(matches!(rx2.recv().await.unwrap(), CoreEvent::BusyChanged { busy: true }));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(CoreEvent::HistoryCleared);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_json_tag() {
        let value = serde_json::to_value(CoreEvent::NotificationDismissed {
            id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(value["event"], "notification_dismissed");
        assert_eq!(value["id"], "abc");
    }
}

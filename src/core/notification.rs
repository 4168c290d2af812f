//! Ephemeral notifications for KisaanMitra.
//!
//! A bounded, newest-first set of alerts. Each alert may carry a TTL; expiry
//! goes through the same [`NotificationQueue::dismiss`] path as a manual
//! dismissal and always removes by id, never by position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::events::{CoreEvent, EventBus};

/// Default number of visible notifications.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 10;

/// Notification severity.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::Info => write!(f, "info"),
            NotificationType::Success => write!(f, "success"),
            NotificationType::Warning => write!(f, "warning"),
            NotificationType::Error => write!(f, "error"),
        }
    }
}

/// A transient alert.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds until self-removal; `None` persists until dismissed.
    pub ttl_ms: Option<u64>,
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<Notification>,
    capacity: usize,
}

/// Bounded notification queue. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct NotificationQueue {
    state: Arc<Mutex<QueueState>>,
    events: EventBus,
}

impl NotificationQueue {
    pub fn new(capacity: usize, events: EventBus) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                capacity,
            })),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A panic elsewhere cannot leave the deque half-updated, so keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push a notification and return its id.
    ///
    /// A non-zero `ttl` schedules expiry on the current tokio runtime.
    pub fn push(&self, message: &str, kind: NotificationType, ttl: Option<Duration>) -> String {
        let ttl = ttl.filter(|d| !d.is_zero());
        let notification = Notification {
            id: ulid::Ulid::new().to_string(),
            message: message.to_string(),
            kind,
            timestamp: Utc::now(),
            ttl_ms: ttl.map(|d| d.as_millis() as u64),
        };
        let id = notification.id.clone();

        let evicted = {
            let mut state = self.lock();
            state.items.push_front(notification.clone());
            let mut evicted = Vec::new();
            while state.items.len() > state.capacity {
                if let Some(old) = state.items.pop_back() {
                    evicted.push(old.id);
                }
            }
            evicted
        };

        tracing::debug!("Notification pushed {} [{}]: {}", id, kind, message);
        self.events.publish(CoreEvent::NotificationPushed { notification });
        for old in evicted {
            tracing::debug!("Notification evicted {}", old);
            self.events.publish(CoreEvent::NotificationDismissed { id: old });
        }

        if let Some(ttl) = ttl {
            self.schedule_expiry(id.clone(), ttl);
        }

        id
    }

    fn schedule_expiry(&self, id: String, ttl: Duration) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!("No async runtime; notification {} will not expire", id);
                return;
            }
        };

        let queue = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if queue.dismiss(&id) {
                tracing::debug!("Notification expired {}", id);
            }
        });
    }

    /// Remove a notification by id. Returns whether anything was removed;
    /// unknown or already-dismissed ids are a no-op.
    pub fn dismiss(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.lock();
            match state.items.iter().position(|n| n.id == id) {
                Some(pos) => state.items.remove(pos).is_some(),
                None => false,
            }
        };

        if removed {
            tracing::debug!("Notification dismissed {}", id);
            self.events.publish(CoreEvent::NotificationDismissed { id: id.to_string() });
        }
        removed
    }

    /// Snapshot of visible notifications, newest first.
    pub fn active(&self) -> Vec<Notification> {
        self.lock().items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY, EventBus::default())
    }
}

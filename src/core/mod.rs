//! Core module - dispatch, classification, history and notifications.
//!
//! This module contains the heart of KisaanMitra's message processing:
//! - Bounded conversation history and notification queue
//! - Utterance classification and agent routing
//! - The dispatch engine tying them together

pub mod backend;
pub mod conversation;
pub mod dispatch;
pub mod events;
pub mod message;
pub mod notification;
pub mod routing;

pub use conversation::ConversationLog;
pub use dispatch::{DispatchConfig, DispatchEngine};
pub use events::CoreEvent;
pub use message::{Attribution, Message, MessageKind, Status};
pub use notification::{Notification, NotificationQueue, NotificationType};
pub use routing::{ClassificationResult, Classifier, Rule};

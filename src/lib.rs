//! KisaanMitra library root.

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod logging;
pub mod preferences;

pub use agent::{AgentCatalog, AgentId, AgentProfile};
pub use cli::Commands;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use core::{
    Attribution, ClassificationResult, Classifier, ConversationLog, CoreEvent, DispatchConfig,
    DispatchEngine, Message, MessageKind, Notification, NotificationQueue, NotificationType, Status,
};
pub use error::{Error, Result};

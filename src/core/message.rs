//! Conversation message types.
//!
//! A [`Message`] is immutable once created. Ids come from a process-wide
//! counter so creation order and id order always agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::agent::AgentId;

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

fn next_message_id() -> u64 {
    NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Who produced a message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::Agent => write!(f, "agent"),
            MessageKind::Error => write!(f, "error"),
        }
    }
}

/// Severity tag on agent replies.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Warning => write!(f, "warning"),
            Status::Danger => write!(f, "danger"),
        }
    }
}

/// Attribution carried on a message: a concrete agent, or the `SYSTEM`
/// sentinel used for errors with no intended target.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(into = "String", try_from = "String")]
pub enum Attribution {
    Agent(AgentId),
    System,
}

impl Attribution {
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Attribution::Agent(id) => Some(*id),
            Attribution::System => None,
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribution::Agent(id) => write!(f, "{}", id),
            Attribution::System => write!(f, "SYSTEM"),
        }
    }
}

impl From<Attribution> for String {
    fn from(a: Attribution) -> Self {
        a.to_string()
    }
}

impl TryFrom<String> for Attribution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("SYSTEM") {
            return Ok(Attribution::System);
        }
        value.parse::<AgentId>().map(Attribution::Agent)
    }
}

impl From<AgentId> for Attribution {
    fn from(id: AgentId) -> Self {
        Attribution::Agent(id)
    }
}

/// One exchanged utterance or reply.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    id: u64,
    kind: MessageKind,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent: Option<Attribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<u8>,
}

impl Message {
    fn new(kind: MessageKind, content: &str, agent: Option<Attribution>) -> Self {
        Self {
            id: next_message_id(),
            kind,
            content: content.to_string(),
            timestamp: Utc::now(),
            agent,
            status: None,
            confidence: None,
        }
    }

    /// A user utterance, optionally addressed to an explicit agent.
    pub fn user(content: &str, target: Option<AgentId>) -> Self {
        Self::new(MessageKind::User, content, target.map(Attribution::Agent))
    }

    /// An agent reply. Confidence is clamped to 0-100.
    pub fn agent_reply(agent: AgentId, content: &str, status: Status, confidence: u8) -> Self {
        let mut msg = Self::new(MessageKind::Agent, content, Some(Attribution::Agent(agent)));
        msg.status = Some(status);
        msg.confidence = Some(confidence.min(100));
        msg
    }

    /// A failure report attributed to the intended agent or `SYSTEM`.
    pub fn error(content: &str, attribution: Attribution) -> Self {
        Self::new(MessageKind::Error, content, Some(attribution))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn agent(&self) -> Option<Attribution> {
        self.agent
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn confidence(&self) -> Option<u8> {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let a = Message::user("first", None);
        let b = Message::user("second", None);
        assert!(b.id() > a.id());
        assert!(b.timestamp() >= a.timestamp());
    }

    #[test]
    fn test_agent_message_fields() {
        let msg = Message::agent_reply(AgentId::Mia, "prices are up", Status::Success, 89);
        assert_eq!(msg.kind(), MessageKind::Agent);
        assert_eq!(msg.agent(), Some(Attribution::Agent(AgentId::Mia)));
        assert_eq!(msg.status(), Some(Status::Success));
        assert_eq!(msg.confidence(), Some(89));

        let clamped = Message::agent_reply(AgentId::Mia, "x", Status::Success, 250);
        assert_eq!(clamped.confidence(), Some(100));
    }

    #[test]
    fn test_user_and_error_have_no_status() {
        let user = Message::user("hello", Some(AgentId::Cra));
        assert_eq!(user.agent(), Some(Attribution::Agent(AgentId::Cra)));
        assert!(user.status().is_none());
        assert!(user.confidence().is_none());

        let err = Message::error("failed", Attribution::System);
        assert_eq!(err.kind(), MessageKind::Error);
        assert!(err.status().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let err = Message::error("failed", Attribution::System);
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["agent"], "SYSTEM");
        assert!(value.get("status").is_none());

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, err);
    }
}

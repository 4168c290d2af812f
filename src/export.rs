//! Conversation export: JSON documents and plain-text transcripts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::core::message::{Message, MessageKind};
use crate::error::Result;

/// Transferable snapshot of the history.
#[derive(Serialize, Debug)]
pub struct ExportDocument<'a> {
    pub exported_at: DateTime<Utc>,
    pub count: usize,
    /// Newest first, as returned by the history.
    pub messages: &'a [Message],
}

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Transcript,
}

impl ExportFormat {
    /// `.json` files get JSON, everything else a transcript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Transcript,
        }
    }
}

pub fn to_json(messages: &[Message]) -> Result<String> {
    let doc = ExportDocument {
        exported_at: Utc::now(),
        count: messages.len(),
        messages,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Plain-text transcript, oldest first.
pub fn to_transcript(messages: &[Message]) -> String {
    let mut out = String::new();

    for msg in messages.iter().rev() {
        let who = match (msg.kind(), msg.agent()) {
            (MessageKind::User, Some(target)) => format!("You -> {}", target),
            (MessageKind::User, None) => "You".to_string(),
            (MessageKind::Agent, Some(agent)) => agent.to_string(),
            (MessageKind::Error, Some(agent)) => format!("{} (error)", agent),
            (_, None) => "SYSTEM".to_string(),
        };

        out.push_str(&format!(
            "[{}] {}",
            msg.timestamp().format("%Y-%m-%d %H:%M:%S"),
            who
        ));
        if let (Some(status), Some(confidence)) = (msg.status(), msg.confidence()) {
            out.push_str(&format!(" [{} {}%]", status, confidence));
        }
        out.push_str(": ");
        out.push_str(msg.content());
        out.push('\n');
    }

    out
}

/// Write `messages` to `path` in the format its extension implies.
pub fn write_to(path: &Path, messages: &[Message]) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path);
    let content = match format {
        ExportFormat::Json => to_json(messages)?,
        ExportFormat::Transcript => to_transcript(messages),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;

    tracing::info!("Exported {} messages to {}", messages.len(), path.display());
    Ok(format)
}

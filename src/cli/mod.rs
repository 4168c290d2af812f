//! CLI commands for KisaanMitra using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::AgentCatalog;
use crate::config::{load_settings_or_default, Settings};
use crate::core::routing::parse_agent_routing;
use crate::core::{CoreEvent, DispatchEngine, Message, MessageKind, NotificationType};
use crate::export;
use crate::logging;
use crate::preferences::{
    FilePreferenceStore, Preferences, Theme, UserProfile, LANGUAGE_KEY, PROFILE_KEY, THEME_KEY,
};

/// KisaanMitra - multi-agent agricultural advisory.
#[derive(Parser)]
#[command(name = "kisaanmitra")]
#[command(version)]
#[command(about = "KisaanMitra - ask the farm advisory agents", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive chat session
    Chat,

    /// Send a single message and print the reply
    Send {
        /// Message to send (prefix with @AGENT to target an agent)
        message: String,

        /// Explicit target agent (CMGA, MIA, GAA, CRA, FIA, LIA, HIA)
        #[arg(long, short)]
        agent: Option<String>,
    },

    /// List the advisory agents
    Agents,

    /// Read or change preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// View logs
    Logs {
        /// Only show lines containing this text
        #[arg(long)]
        filter: Option<String>,

        /// Number of trailing lines
        #[arg(long, default_value_t = 120)]
        lines: usize,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommand {
    /// Show one preference (theme, language, profile)
    Get { key: String },

    /// Set a preference; profile takes a JSON object
    Set { key: String, value: String },
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let settings = load_settings_or_default();

        match &self.command {
            Command::Chat => cmd_chat(&settings).await,
            Command::Send { message, agent } => cmd_send(&settings, message, agent.as_deref()).await,
            Command::Agents => cmd_agents(&settings),
            Command::Prefs(cmd) => cmd_prefs(&settings, cmd),
            Command::Logs { filter, lines } => cmd_logs(filter.as_deref(), *lines),
        }
    }
}

fn build_engine(settings: &Settings) -> DispatchEngine {
    let catalog = Arc::new(AgentCatalog::from_settings(&settings.agents));
    DispatchEngine::new(settings.dispatch_config(), catalog)
}

fn preference_store(settings: &Settings) -> Result<FilePreferenceStore> {
    Ok(match &settings.preferences_path {
        Some(path) => FilePreferenceStore::new(path),
        None => FilePreferenceStore::default_location()?,
    })
}

/// Split an `@AGENT text` prefix off unless an explicit agent was given.
fn split_target(message: &str, agent: Option<&str>) -> (Option<String>, String) {
    if let Some(agent) = agent {
        return (Some(agent.to_string()), message.to_string());
    }
    match parse_agent_routing(message) {
        Some((id, rest)) => (Some(id), rest),
        None => (None, message.to_string()),
    }
}

fn render(msg: &Message) -> String {
    let who = msg
        .agent()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "SYSTEM".to_string());
    match msg.kind() {
        MessageKind::Agent => format!(
            "{} [{} {}%]: {}",
            who,
            msg.status().map(|s| s.to_string()).unwrap_or_default(),
            msg.confidence().unwrap_or_default(),
            msg.content()
        ),
        MessageKind::Error => format!("{} (error): {}", who, msg.content()),
        MessageKind::User => format!("you: {}", msg.content()),
    }
}

// Command implementations

async fn cmd_send(settings: &Settings, message: &str, agent: Option<&str>) -> Result<()> {
    let engine = build_engine(settings);
    let (target, text) = split_target(message, agent);

    match engine.send(&text, target.as_deref()).await {
        Some(reply) => println!("{}", render(&reply)),
        None => println!("Nothing to send."),
    }
    Ok(())
}

async fn cmd_chat(settings: &Settings) -> Result<()> {
    let engine = build_engine(settings);
    let ui_ttl = Some(settings.default_notification_ttl());

    // Surface notifications as they arrive
    let mut events = engine.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CoreEvent::NotificationPushed { notification }) => {
                    println!("  ! [{}] {}", notification.kind, notification.message);
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Chat event watcher lagged by {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("KisaanMitra chat. Prefix a message with @AGENT to pick an agent.");
    println!("Commands: /history, /search TEXT, /notifications, /clear, /export PATH, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            let (name, arg) = command
                .split_once(char::is_whitespace)
                .map(|(n, a)| (n, a.trim()))
                .unwrap_or((command, ""));

            match name {
                "quit" | "exit" => break,
                "history" => {
                    for msg in engine.history().iter().rev() {
                        println!("{}", render(msg));
                    }
                }
                "search" => {
                    let found = engine.search_history(arg);
                    if found.is_empty() {
                        engine.notifications().push(
                            &format!("No messages match '{}'", arg),
                            NotificationType::Info,
                            ui_ttl,
                        );
                    }
                    for msg in found.iter().rev() {
                        println!("{}", render(msg));
                    }
                }
                "notifications" => {
                    for n in engine.notifications().active() {
                        println!("[{}] {} ({})", n.kind, n.message, n.id);
                    }
                }
                "clear" => {
                    engine.clear_history();
                    engine
                        .notifications()
                        .push("Chat history cleared", NotificationType::Success, ui_ttl);
                }
                "export" => {
                    if arg.is_empty() {
                        println!("Usage: /export PATH");
                        continue;
                    }
                    match export::write_to(&PathBuf::from(arg), &engine.history()) {
                        Ok(format) => println!("Exported history as {:?} to {}", format, arg),
                        Err(e) => {
                            tracing::warn!("Export to {} failed: {}", arg, e);
                            engine.notifications().push(
                                &format!("Export failed: {}", e),
                                NotificationType::Error,
                                ui_ttl,
                            );
                        }
                    }
                }
                other => println!("Unknown command: /{}", other),
            }
            continue;
        }

        let (target, text) = split_target(line, None);
        if let Some(reply) = engine.send(&text, target.as_deref()).await {
            println!("{}", render(&reply));
        }
    }

    watcher.abort();
    Ok(())
}

fn cmd_agents(settings: &Settings) -> Result<()> {
    let catalog = AgentCatalog::from_settings(&settings.agents);
    for profile in catalog.iter() {
        println!("{:<5} {} - {}", profile.id, profile.name, profile.domain);
        println!("      capabilities: {}", profile.capabilities.join(", "));
    }
    Ok(())
}

fn cmd_prefs(settings: &Settings, cmd: &PrefsCommand) -> Result<()> {
    let prefs = Preferences::new(preference_store(settings)?);

    match cmd {
        PrefsCommand::Get { key } => match key.as_str() {
            THEME_KEY => println!("{}", prefs.theme()?),
            LANGUAGE_KEY => println!("{}", prefs.language()?),
            PROFILE_KEY => match prefs.profile()? {
                Some(p) => println!("{}", serde_json::to_string_pretty(&p)?),
                None => println!("No profile set."),
            },
            other => anyhow::bail!("Unknown preference key: {}", other),
        },
        PrefsCommand::Set { key, value } => {
            match key.as_str() {
                THEME_KEY => {
                    let theme: Theme = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                    prefs.set_theme(theme)?;
                }
                LANGUAGE_KEY => prefs.set_language(value)?,
                PROFILE_KEY => {
                    let profile: UserProfile = serde_json::from_str(value)?;
                    prefs.set_profile(&profile)?;
                }
                other => anyhow::bail!("Unknown preference key: {}", other),
            }
            println!("Saved {}.", key);
        }
    }
    Ok(())
}

fn cmd_logs(filter: Option<&str>, count: usize) -> Result<()> {
    let log_dir = logging::log_dir()?;

    // Rolling files sort by date suffix; show the newest
    let mut files: Vec<PathBuf> = match std::fs::read_dir(&log_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(logging::LOG_FILE_PREFIX))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();

    let Some(file) = files.pop() else {
        println!("No log files in {}", log_dir.display());
        return Ok(());
    };

    let content = std::fs::read_to_string(&file)?;
    let mut lines: Vec<&str> = content.lines().collect();
    if let Some(needle) = filter {
        let needle = needle.to_lowercase();
        lines.retain(|l| l.to_lowercase().contains(&needle));
    }
    let start = lines.len().saturating_sub(count);
    for line in &lines[start..] {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::core::message::Status;

    #[test]
    fn test_split_target() {
        let (t, m) = split_target("@mia onion price", None);
        assert_eq!(t.as_deref(), Some("MIA"));
        assert_eq!(m, "onion price");

        // Explicit flag wins and leaves the text alone
        let (t, m) = split_target("@mia onion price", Some("FIA"));
        assert_eq!(t.as_deref(), Some("FIA"));
        assert_eq!(m, "@mia onion price");

        let (t, _) = split_target("no prefix here", None);
        assert!(t.is_none());
    }

    #[test]
    fn test_render() {
        let reply = Message::agent_reply(AgentId::Gaa, "check leaves", Status::Warning, 82);
        assert_eq!(render(&reply), "GAA [warning 82%]: check leaves");

        let user = Message::user("hello", None);
        assert_eq!(render(&user), "you: hello");
    }

    #[test]
    fn test_cli_parses() {
        let cmd = Commands::try_parse_from(["kisaanmitra", "send", "hello", "--agent", "MIA"]).unwrap();
        match cmd.command {
            Command::Send { message, agent } => {
                assert_eq!(message, "hello");
                assert_eq!(agent.as_deref(), Some("MIA"));
            }
            _ => panic!("expected send"),
        }

        assert!(Commands::try_parse_from(["kisaanmitra", "prefs", "set", "theme", "dark"]).is_ok());
    }
}

//! Control channel: inbound commands and their replies.
//!
//! Commands arrive as tagged JSON messages, each optionally carrying a
//! reply channel. The tag set is closed; unknown types are logged and
//! dropped without surfacing an error to the sender.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::oneshot;

use crate::worker::Worker;

/// The closed set of inbound commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Force immediate activation.
    SkipWaiting,
    /// Reply with the current cache version.
    GetVersion,
    /// Run cleanup, then reply with success.
    ForceUpdate,
    /// Reply with per-store entry counts, version, and a timestamp.
    CacheStatus,
}

impl Command {
    /// Parse a tagged message. Unknown or missing tags are logged at
    /// warn and ignored.
    pub fn parse(message: &serde_json::Value) -> Option<Command> {
        match message.get("type").and_then(|t| t.as_str()) {
            Some("SKIP_WAITING") => Some(Command::SkipWaiting),
            Some("GET_VERSION") => Some(Command::GetVersion),
            Some("FORCE_UPDATE") => Some(Command::ForceUpdate),
            Some("CACHE_STATUS") => Some(Command::CacheStatus),
            other => {
                tracing::warn!(message_type = ?other, "unknown message type");
                None
            }
        }
    }
}

/// Reply to `GET_VERSION`.
#[derive(Debug, Serialize)]
pub struct VersionReply {
    pub version: String,
}

/// Reply to `FORCE_UPDATE`.
#[derive(Debug, Serialize)]
pub struct UpdateReply {
    pub success: bool,
}

/// Reply to `CACHE_STATUS`: entry count per existing store.
#[derive(Debug, Serialize)]
pub struct CacheStatusReply {
    pub version: String,
    pub caches: BTreeMap<String, usize>,
    pub timestamp: String,
}

/// An inbound message with its optional reply channel.
#[derive(Debug)]
pub struct Message {
    pub command: Command,
    pub reply: Option<oneshot::Sender<serde_json::Value>>,
}

/// Execute a command, returning the reply payload where the command
/// defines one.
pub async fn dispatch(worker: &Worker, command: Command) -> Option<serde_json::Value> {
    match command {
        Command::SkipWaiting => {
            worker.skip_waiting().await;
            None
        }
        Command::GetVersion => {
            let reply = VersionReply { version: worker.config().cache_version.clone() };
            serde_json::to_value(reply).ok()
        }
        Command::ForceUpdate => {
            worker.cleanup().await;
            serde_json::to_value(UpdateReply { success: true }).ok()
        }
        Command::CacheStatus => {
            let mut caches = BTreeMap::new();
            for name in worker.storage().store_names().await {
                let count = worker.storage().len(&name).await;
                caches.insert(name, count);
            }
            let reply = CacheStatusReply {
                version: worker.config().cache_version.clone(),
                caches,
                timestamp: chrono::Utc::now().to_rfc3339(),
            };
            serde_json::to_value(reply).ok()
        }
    }
}

/// Execute a message and deliver the reply on its channel, if any.
/// A closed reply channel is the sender's problem, not ours.
pub async fn handle_message(worker: &Worker, message: Message) {
    let reply = dispatch(worker, message.command).await;
    if let (Some(tx), Some(value)) = (message.reply, reply) {
        let _ = tx.send(value);
    }
}

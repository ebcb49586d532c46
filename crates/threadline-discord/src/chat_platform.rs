//! The platform seam the sync engine mutates state through.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::discord_types::{DiscordMessage, DiscordThread, Embed};

/// Position in a channel's message history to page from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageCursor {
    /// Messages strictly older than the id, newest first.
    Before(String),
    /// Messages strictly newer than the id, oldest first.
    After(String),
    /// The most recent page, newest first.
    Latest,
}

impl MessageCursor {
    /// Cursor for reading a channel from its very first message.
    pub fn from_start() -> Self {
        Self::After("0".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivedThreadsPage {
    pub threads: Vec<DiscordThread>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartThreadRequest {
    pub name: String,
    pub auto_archive_duration: u32,
    #[serde(rename = "type")]
    pub thread_type: u8,
}

#[async_trait]
/// Thread and message operations against a chat platform.
///
/// Implementations return `anyhow` errors with operation context; callers
/// classify every failure here as a transport failure.
pub trait ChatPlatform: Send + Sync {
    async fn channel_guild_id(&self, channel_id: &str) -> Result<String>;

    async fn list_active_threads(&self, guild_id: &str) -> Result<Vec<DiscordThread>>;

    async fn list_public_archived_threads(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<ArchivedThreadsPage>;

    async fn start_thread(
        &self,
        parent_channel_id: &str,
        request: &StartThreadRequest,
    ) -> Result<DiscordThread>;

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<DiscordMessage>;

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<DiscordMessage>;

    /// One page of history. `After` pages come back oldest first, the other
    /// cursors newest first.
    async fn list_messages(
        &self,
        channel_id: &str,
        cursor: &MessageCursor,
        limit: usize,
    ) -> Result<Vec<DiscordMessage>>;
}

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use threadline_core::{request_json, Replay, RetryPolicy};

use crate::chat_platform::{ArchivedThreadsPage, ChatPlatform, MessageCursor, StartThreadRequest};
use crate::discord_types::{
    compare_snowflakes, DiscordChannel, DiscordMessage, DiscordThread, Embed,
};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize)]
struct ThreadListResponse {
    #[serde(default)]
    threads: Vec<DiscordThread>,
    #[serde(default)]
    has_more: bool,
}

/// Bot-token authenticated Discord REST client with bounded retry.
#[derive(Clone)]
pub struct DiscordApiClient {
    http: reqwest::Client,
    api_base: String,
    retry: RetryPolicy,
}

impl DiscordApiClient {
    pub fn new(
        api_base: String,
        bot_token: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(
                "DiscordBot (https://github.com/threadline/threadline, 0.1)",
            ),
        );
        let auth_header = format!("Bot {}", bot_token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid discord authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create discord api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(retry_max_attempts, retry_base_delay_ms),
        })
    }

    async fn request<T, F>(&self, operation: &str, replay: Replay, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        request_json("discord api", operation, self.retry, replay, request_builder).await
    }
}

#[async_trait]
impl ChatPlatform for DiscordApiClient {
    async fn channel_guild_id(&self, channel_id: &str) -> Result<String> {
        let channel: DiscordChannel = self
            .request("get channel", Replay::Idempotent, || {
                self.http
                    .get(format!("{}/channels/{}", self.api_base, channel_id))
            })
            .await?;
        match channel.guild_id {
            Some(guild_id) if !guild_id.trim().is_empty() => Ok(guild_id),
            _ => bail!("discord channel {channel_id} does not belong to a guild"),
        }
    }

    async fn list_active_threads(&self, guild_id: &str) -> Result<Vec<DiscordThread>> {
        let response: ThreadListResponse = self
            .request("list active threads", Replay::Idempotent, || {
                self.http
                    .get(format!("{}/guilds/{}/threads/active", self.api_base, guild_id))
            })
            .await?;
        Ok(response.threads)
    }

    async fn list_public_archived_threads(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<ArchivedThreadsPage> {
        let limit_value = limit.clamp(2, 100).to_string();
        let response: ThreadListResponse = self
            .request("list public archived threads", Replay::Idempotent, || {
                let mut request = self
                    .http
                    .get(format!(
                        "{}/channels/{}/threads/archived/public",
                        self.api_base, channel_id
                    ))
                    .query(&[("limit", limit_value.as_str())]);
                if let Some(before) = before {
                    request = request.query(&[("before", before)]);
                }
                request
            })
            .await?;
        Ok(ArchivedThreadsPage {
            threads: response.threads,
            has_more: response.has_more,
        })
    }

    async fn start_thread(
        &self,
        parent_channel_id: &str,
        request: &StartThreadRequest,
    ) -> Result<DiscordThread> {
        self.request("start thread", Replay::CreatesResource, || {
            self.http
                .post(format!(
                    "{}/channels/{}/threads",
                    self.api_base, parent_channel_id
                ))
                .json(request)
        })
        .await
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<DiscordMessage> {
        let payload = json!({ "embeds": [embed] });
        self.request("create message", Replay::CreatesResource, || {
            self.http
                .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
                .json(&payload)
        })
        .await
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<DiscordMessage> {
        let payload = json!({ "embeds": [embed] });
        self.request("edit message", Replay::Idempotent, || {
            self.http
                .patch(format!(
                    "{}/channels/{}/messages/{}",
                    self.api_base, channel_id, message_id
                ))
                .json(&payload)
        })
        .await
    }

    async fn list_messages(
        &self,
        channel_id: &str,
        cursor: &MessageCursor,
        limit: usize,
    ) -> Result<Vec<DiscordMessage>> {
        let limit_value = limit.clamp(1, 100).to_string();
        let mut messages: Vec<DiscordMessage> = self
            .request("list messages", Replay::Idempotent, || {
                let request = self
                    .http
                    .get(format!("{}/channels/{}/messages", self.api_base, channel_id))
                    .query(&[("limit", limit_value.as_str())]);
                match cursor {
                    MessageCursor::Before(id) => request.query(&[("before", id.as_str())]),
                    MessageCursor::After(id) => request.query(&[("after", id.as_str())]),
                    MessageCursor::Latest => request,
                }
            })
            .await?;
        // Discord returns newest first regardless of cursor direction.
        match cursor {
            MessageCursor::After(_) => {
                messages.sort_by(|left, right| compare_snowflakes(&left.id, &right.id))
            }
            MessageCursor::Before(_) | MessageCursor::Latest => {
                messages.sort_by(|left, right| compare_snowflakes(&right.id, &left.id))
            }
        }
        Ok(messages)
    }
}

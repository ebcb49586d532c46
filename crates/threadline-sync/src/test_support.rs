//! In-memory `ChatPlatform` used by the engine's unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use threadline_discord::{
    compare_snowflakes, ArchivedThreadsPage, ChatPlatform, DiscordMessage, DiscordThread, Embed,
    MessageCursor, StartThreadRequest, ThreadMetadata,
};

pub(crate) const GUILD_ID: &str = "G1";
pub(crate) const PARENT_ID: &str = "C1";

#[derive(Debug)]
struct FakeThread {
    thread: DiscordThread,
    visible_after_active_scans: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    threads: Vec<FakeThread>,
    messages: BTreeMap<String, Vec<DiscordMessage>>,
    active_scans: usize,
    archived_page_size: Option<usize>,
    archived_requests: Vec<Option<String>>,
    started: Vec<StartThreadRequest>,
    sent: Vec<(String, Embed)>,
    edited: Vec<(String, String, Embed)>,
    fail_active_listing: bool,
    fail_sends: bool,
}

impl FakeState {
    fn allocate_id(&mut self) -> String {
        self.next_id = self.next_id.saturating_add(1);
        (1_000 + self.next_id).to_string()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, apply: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut guard)
    }

    pub(crate) fn seed_thread(&self, name: &str) -> String {
        self.seed_thread_visible_after(name, 0)
    }

    /// Thread that only shows up in active listings after `scans` earlier
    /// listings, modelling eventual consistency.
    pub(crate) fn seed_thread_visible_after(&self, name: &str, scans: usize) -> String {
        self.with_state(|state| {
            let id = state.allocate_id();
            state.threads.push(FakeThread {
                thread: DiscordThread {
                    id: id.clone(),
                    parent_id: Some(PARENT_ID.to_string()),
                    name: name.to_string(),
                    thread_metadata: None,
                },
                visible_after_active_scans: scans,
            });
            id
        })
    }

    pub(crate) fn seed_foreign_thread(&self, parent_id: &str, name: &str) -> String {
        self.with_state(|state| {
            let id = state.allocate_id();
            state.threads.push(FakeThread {
                thread: DiscordThread {
                    id: id.clone(),
                    parent_id: Some(parent_id.to_string()),
                    name: name.to_string(),
                    thread_metadata: None,
                },
                visible_after_active_scans: 0,
            });
            id
        })
    }

    pub(crate) fn seed_archived_thread(&self, name: &str, archive_timestamp: &str) -> String {
        self.with_state(|state| {
            let id = state.allocate_id();
            state.threads.push(FakeThread {
                thread: DiscordThread {
                    id: id.clone(),
                    parent_id: Some(PARENT_ID.to_string()),
                    name: name.to_string(),
                    thread_metadata: Some(ThreadMetadata {
                        archived: true,
                        archive_timestamp: Some(archive_timestamp.to_string()),
                        locked: None,
                    }),
                },
                visible_after_active_scans: 0,
            });
            id
        })
    }

    pub(crate) fn seed_message(&self, channel_id: &str, embeds: Vec<Embed>) -> String {
        self.with_state(|state| {
            let id = state.allocate_id();
            state
                .messages
                .entry(channel_id.to_string())
                .or_default()
                .push(DiscordMessage {
                    id: id.clone(),
                    channel_id: channel_id.to_string(),
                    embeds,
                });
            id
        })
    }

    pub(crate) fn set_archived_page_size(&self, size: usize) {
        self.with_state(|state| state.archived_page_size = Some(size));
    }

    pub(crate) fn fail_active_listing(&self) {
        self.with_state(|state| state.fail_active_listing = true);
    }

    pub(crate) fn fail_sends(&self) {
        self.with_state(|state| state.fail_sends = true);
    }

    pub(crate) fn active_scans(&self) -> usize {
        self.with_state(|state| state.active_scans)
    }

    pub(crate) fn archived_requests(&self) -> Vec<Option<String>> {
        self.with_state(|state| state.archived_requests.clone())
    }

    pub(crate) fn started(&self) -> Vec<StartThreadRequest> {
        self.with_state(|state| state.started.clone())
    }

    pub(crate) fn sent(&self) -> Vec<(String, Embed)> {
        self.with_state(|state| state.sent.clone())
    }

    pub(crate) fn edited(&self) -> Vec<(String, String, Embed)> {
        self.with_state(|state| state.edited.clone())
    }

    pub(crate) fn messages(&self, channel_id: &str) -> Vec<DiscordMessage> {
        self.with_state(|state| {
            state
                .messages
                .get(channel_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    pub(crate) fn thread_names(&self) -> Vec<String> {
        self.with_state(|state| {
            state
                .threads
                .iter()
                .map(|entry| entry.thread.name.clone())
                .collect()
        })
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn channel_guild_id(&self, channel_id: &str) -> Result<String> {
        if channel_id == PARENT_ID {
            Ok(GUILD_ID.to_string())
        } else {
            bail!("unknown channel {channel_id}")
        }
    }

    async fn list_active_threads(&self, guild_id: &str) -> Result<Vec<DiscordThread>> {
        self.with_state(|state| {
            if state.fail_active_listing {
                bail!("discord api list active threads failed with status 500: boom");
            }
            if guild_id != GUILD_ID {
                bail!("unknown guild {guild_id}");
            }
            let scans_before = state.active_scans;
            state.active_scans = state.active_scans.saturating_add(1);
            Ok(state
                .threads
                .iter()
                .filter(|entry| !entry.thread.archived())
                .filter(|entry| entry.visible_after_active_scans <= scans_before)
                .map(|entry| entry.thread.clone())
                .collect())
        })
    }

    async fn list_public_archived_threads(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<ArchivedThreadsPage> {
        self.with_state(|state| {
            state.archived_requests.push(before.map(ToOwned::to_owned));
            let page_size = state.archived_page_size.unwrap_or(limit).max(1);
            let mut archived = state
                .threads
                .iter()
                .filter(|entry| entry.thread.archived() && entry.thread.has_parent(channel_id))
                .filter(|entry| match (before, entry.thread.archive_timestamp()) {
                    (Some(before), Some(stamp)) => stamp < before,
                    _ => true,
                })
                .map(|entry| entry.thread.clone())
                .collect::<Vec<_>>();
            archived.sort_by(|left, right| right.archive_timestamp().cmp(&left.archive_timestamp()));
            let has_more = archived.len() > page_size;
            archived.truncate(page_size);
            Ok(ArchivedThreadsPage {
                threads: archived,
                has_more,
            })
        })
    }

    async fn start_thread(
        &self,
        parent_channel_id: &str,
        request: &StartThreadRequest,
    ) -> Result<DiscordThread> {
        self.with_state(|state| {
            state.started.push(request.clone());
            let id = state.allocate_id();
            let thread = DiscordThread {
                id,
                parent_id: Some(parent_channel_id.to_string()),
                name: request.name.clone(),
                thread_metadata: None,
            };
            state.threads.push(FakeThread {
                thread: thread.clone(),
                visible_after_active_scans: 0,
            });
            Ok(thread)
        })
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<DiscordMessage> {
        self.with_state(|state| {
            if state.fail_sends {
                bail!("discord api create message failed with status 403: Missing Access");
            }
            state.sent.push((channel_id.to_string(), embed.clone()));
            let id = state.allocate_id();
            let message = DiscordMessage {
                id,
                channel_id: channel_id.to_string(),
                embeds: vec![embed.clone()],
            };
            state
                .messages
                .entry(channel_id.to_string())
                .or_default()
                .push(message.clone());
            Ok(message)
        })
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<DiscordMessage> {
        self.with_state(|state| {
            state
                .edited
                .push((channel_id.to_string(), message_id.to_string(), embed.clone()));
            let message = state
                .messages
                .get_mut(channel_id)
                .and_then(|messages| messages.iter_mut().find(|message| message.id == message_id))
                .ok_or_else(|| anyhow!("unknown message {message_id}"))?;
            message.embeds = vec![embed.clone()];
            Ok(message.clone())
        })
    }

    async fn list_messages(
        &self,
        channel_id: &str,
        cursor: &MessageCursor,
        limit: usize,
    ) -> Result<Vec<DiscordMessage>> {
        self.with_state(|state| {
            let mut messages = state
                .messages
                .get(channel_id)
                .cloned()
                .unwrap_or_default();
            match cursor {
                MessageCursor::After(after) => {
                    messages.retain(|message| compare_snowflakes(&message.id, after).is_gt());
                    messages.sort_by(|left, right| compare_snowflakes(&left.id, &right.id));
                }
                MessageCursor::Before(before) => {
                    messages.retain(|message| compare_snowflakes(&message.id, before).is_lt());
                    messages.sort_by(|left, right| compare_snowflakes(&right.id, &left.id));
                }
                MessageCursor::Latest => {
                    messages.sort_by(|left, right| compare_snowflakes(&right.id, &left.id));
                }
            }
            messages.truncate(limit);
            Ok(messages)
        })
    }
}

//! Entity number to Discord thread, by scanning thread listings.
//!
//! Active threads of the guild are checked first, then the parent channel's
//! public archive is paged by archive timestamp. A thread created moments ago
//! may not be listed yet, so [`ThreadResolver::find_thread_by_number`] repeats
//! the scan under a bounded retry policy. Listing failures are not retried
//! here: the API clients already retry transient HTTP errors.

use std::future::Future;

use threadline_core::CancelSignal;
use threadline_discord::{ChatPlatform, DiscordThread};

use crate::correlation::thread_name_matches;
use crate::event_model::EntityRef;
use crate::sync_config::{SyncConfig, ThreadLookupPolicy};
use crate::sync_error::{LookupTarget, SyncError};

const ARCHIVED_PAGE_SIZE: usize = 100;

pub struct ThreadResolver<'a> {
    platform: &'a dyn ChatPlatform,
    parent_channel_id: &'a str,
    guild_id: Option<&'a str>,
    lookup: ThreadLookupPolicy,
}

impl<'a> ThreadResolver<'a> {
    pub fn new(platform: &'a dyn ChatPlatform, config: &'a SyncConfig) -> Self {
        Self {
            platform,
            parent_channel_id: &config.parent_channel_id,
            guild_id: config.guild_id.as_deref(),
            lookup: config.thread_lookup,
        }
    }

    /// Scans until the thread shows up or the attempt budget runs out.
    pub async fn find_thread_by_number(
        &self,
        entity: EntityRef,
        cancel: &CancelSignal,
    ) -> Result<DiscordThread, SyncError> {
        let guild_id = self.guild_id(entity, cancel).await?;
        let max_attempts = self.lookup.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if let Some(thread) = self.scan(entity, &guild_id, cancel).await? {
                return Ok(thread);
            }
            if attempt < max_attempts {
                tracing::debug!(
                    entity = %entity,
                    attempt,
                    max_attempts,
                    delay_ms = self.lookup.retry_delay.as_millis() as u64,
                    "thread not listed yet; waiting before rescanning"
                );
                cancel
                    .sleep(self.lookup.retry_delay)
                    .await
                    .map_err(|_| SyncError::cancelled(entity, "thread lookup wait"))?;
            }
        }
        tracing::warn!(
            entity = %entity,
            max_attempts,
            waited_ms = self.lookup.max_wait().as_millis() as u64,
            "thread lookup exhausted"
        );
        Err(SyncError::not_found(entity, LookupTarget::Thread))
    }

    /// A single scan with no waiting.
    pub async fn probe_thread_by_number(
        &self,
        entity: EntityRef,
        cancel: &CancelSignal,
    ) -> Result<Option<DiscordThread>, SyncError> {
        let guild_id = self.guild_id(entity, cancel).await?;
        self.scan(entity, &guild_id, cancel).await
    }

    async fn guild_id(&self, entity: EntityRef, cancel: &CancelSignal) -> Result<String, SyncError> {
        if let Some(guild_id) = self.guild_id {
            return Ok(guild_id.to_string());
        }
        guarded(
            entity,
            "get parent channel",
            cancel,
            self.platform.channel_guild_id(self.parent_channel_id),
        )
        .await
    }

    async fn scan(
        &self,
        entity: EntityRef,
        guild_id: &str,
        cancel: &CancelSignal,
    ) -> Result<Option<DiscordThread>, SyncError> {
        let active = guarded(
            entity,
            "list active threads",
            cancel,
            self.platform.list_active_threads(guild_id),
        )
        .await?;
        if let Some(thread) = active.into_iter().find(|thread| {
            thread.has_parent(self.parent_channel_id) && thread_name_matches(&thread.name, entity.number)
        }) {
            return Ok(Some(thread));
        }

        let mut before: Option<String> = None;
        loop {
            let page = guarded(
                entity,
                "list archived threads",
                cancel,
                self.platform.list_public_archived_threads(
                    self.parent_channel_id,
                    before.as_deref(),
                    ARCHIVED_PAGE_SIZE,
                ),
            )
            .await?;
            let next_before = page
                .threads
                .last()
                .and_then(|thread| thread.archive_timestamp())
                .map(ToOwned::to_owned);
            if let Some(thread) = page
                .threads
                .into_iter()
                .find(|thread| thread_name_matches(&thread.name, entity.number))
            {
                return Ok(Some(thread));
            }
            if !page.has_more {
                return Ok(None);
            }
            match next_before {
                Some(next) if before.as_deref() != Some(next.as_str()) => before = Some(next),
                _ => return Ok(None),
            }
        }
    }
}

/// Runs one platform call under the cancel signal, classifying failures.
pub(crate) async fn guarded<T, F>(
    entity: EntityRef,
    operation: &'static str,
    cancel: &CancelSignal,
    call: F,
) -> Result<T, SyncError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match cancel.run(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(SyncError::transport(entity, operation, error)),
        Err(_) => Err(SyncError::cancelled(entity, operation)),
    }
}

//! Finds earlier threadline messages inside a thread by what their single
//! embed encodes: the correlation id in the footer, or the entity number in
//! the opening title.

use threadline_core::CancelSignal;
use threadline_discord::{compare_snowflakes, ChatPlatform, DiscordMessage, Embed, MessageCursor};

use crate::correlation::{decode_footer, decode_opening_number};
use crate::event_model::EntityRef;
use crate::sync_error::{LookupTarget, SyncError};
use crate::thread_resolver::guarded;

const MESSAGE_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// From the start of the thread; the opening message lives there.
    OldestFirst,
    /// From the latest message; recent replies are edited most often.
    NewestFirst,
}

pub struct MessageResolver<'a> {
    platform: &'a dyn ChatPlatform,
}

impl<'a> MessageResolver<'a> {
    pub fn new(platform: &'a dyn ChatPlatform) -> Self {
        Self { platform }
    }

    pub async fn find_message_by_correlation(
        &self,
        channel_id: &str,
        entity: EntityRef,
        correlation_id: u64,
        direction: ScanDirection,
        cancel: &CancelSignal,
    ) -> Result<DiscordMessage, SyncError> {
        self.scan(channel_id, entity, direction, cancel, |embed| {
            embed.footer_text().and_then(decode_footer) == Some(correlation_id)
        })
        .await?
        .ok_or_else(|| SyncError::not_found(entity, LookupTarget::Reply { correlation_id }))
    }

    pub async fn find_opening_message(
        &self,
        channel_id: &str,
        entity: EntityRef,
        cancel: &CancelSignal,
    ) -> Result<DiscordMessage, SyncError> {
        self.scan(
            channel_id,
            entity,
            ScanDirection::OldestFirst,
            cancel,
            |embed| {
                embed.title.as_deref().and_then(decode_opening_number) == Some(entity.number)
            },
        )
        .await?
        .ok_or_else(|| SyncError::not_found(entity, LookupTarget::OpeningMessage))
    }

    async fn scan(
        &self,
        channel_id: &str,
        entity: EntityRef,
        direction: ScanDirection,
        cancel: &CancelSignal,
        matches: impl Fn(&Embed) -> bool,
    ) -> Result<Option<DiscordMessage>, SyncError> {
        let mut cursor = match direction {
            ScanDirection::OldestFirst => MessageCursor::from_start(),
            ScanDirection::NewestFirst => MessageCursor::Latest,
        };
        let mut pages = 0usize;
        loop {
            let page = guarded(
                entity,
                "list messages",
                cancel,
                self.platform
                    .list_messages(channel_id, &cursor, MESSAGE_PAGE_SIZE),
            )
            .await?;
            pages = pages.saturating_add(1);
            if page.is_empty() {
                tracing::debug!(entity = %entity, channel_id, pages, "message scan reached the end");
                return Ok(None);
            }

            let extreme = match direction {
                ScanDirection::OldestFirst => page
                    .iter()
                    .max_by(|left, right| compare_snowflakes(&left.id, &right.id)),
                ScanDirection::NewestFirst => page
                    .iter()
                    .min_by(|left, right| compare_snowflakes(&left.id, &right.id)),
            }
            .map(|message| message.id.clone());

            if let Some(found) = page
                .into_iter()
                .find(|message| message.single_embed().is_some_and(&matches))
            {
                return Ok(Some(found));
            }

            let next = match (direction, extreme) {
                (ScanDirection::OldestFirst, Some(id)) => MessageCursor::After(id),
                (ScanDirection::NewestFirst, Some(id)) => MessageCursor::Before(id),
                (_, None) => return Ok(None),
            };
            if next == cursor {
                return Ok(None);
            }
            cursor = next;
        }
    }
}

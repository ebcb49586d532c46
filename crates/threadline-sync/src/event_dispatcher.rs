//! Applies one decoded GitHub event to the Discord side.
//!
//! Every handler follows the same shape: locate the entity's thread (and, when
//! editing, the earlier message) through the resolvers, render with the embed
//! factory, then create or edit through the [`ChatPlatform`]. Nothing is
//! remembered between events.

use std::sync::Arc;

use threadline_core::CancelSignal;
use threadline_discord::{
    ChatPlatform, DiscordMessage, DiscordThread, StartThreadRequest, PUBLIC_THREAD_TYPE,
    THREAD_AUTO_ARCHIVE_WEEK,
};

use crate::correlation::encode_thread_name;
use crate::dispatch_table::{route, HandlerKind};
use crate::embed_factory::{opening_embed, reply_embed, status_embed, tombstone_embed};
use crate::event_model::{Entity, RawEvent, SyncEvent};
use crate::message_resolver::{MessageResolver, ScanDirection};
use crate::sync_config::{OpenConflictPolicy, SyncConfig};
use crate::sync_error::SyncError;
use crate::thread_resolver::{guarded, ThreadResolver};


/// What a successful dispatch changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    ThreadCreated {
        thread_id: String,
        message_id: String,
    },
    OpeningEdited {
        thread_id: String,
        message_id: String,
    },
    StatusPosted {
        thread_id: String,
        message_id: String,
        opening_refreshed: bool,
    },
    /// `correlation_id` is `None` for a review thread without a numeric id.
    ReplyPosted {
        thread_id: String,
        message_id: String,
        correlation_id: Option<u64>,
    },
    ReplyEdited {
        thread_id: String,
        message_id: String,
        correlation_id: u64,
    },
    TombstonePosted {
        thread_id: String,
        message_id: String,
        correlation_id: Option<u64>,
    },
    /// The action is not synced for its event kind.
    Skipped { reason: String },
}

#[derive(Clone)]
pub struct EventDispatcher {
    platform: Arc<dyn ChatPlatform>,
    config: Arc<SyncConfig>,
}

impl EventDispatcher {
    pub fn new(platform: Arc<dyn ChatPlatform>, config: Arc<SyncConfig>) -> Self {
        Self { platform, config }
    }

    /// Decodes a raw envelope (webhook or Events API naming) and dispatches it.
    pub async fn dispatch_event(
        &self,
        raw: &RawEvent,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let event = SyncEvent::decode(raw)?;
        self.dispatch(&event, cancel).await
    }

    pub async fn dispatch(
        &self,
        event: &SyncEvent,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let Some(handler) = route(event.kind, &event.action) else {
            let reason = format!("{} action '{}' is not synced", event.kind, event.action);
            tracing::info!(kind = %event.kind, action = %event.action, "skipping event");
            return Ok(DispatchOutcome::Skipped { reason });
        };
        let entity = event.entity()?;
        tracing::debug!(
            entity = %entity.entity_ref(),
            kind = %event.kind,
            action = %event.action,
            ?handler,
            "dispatching event"
        );
        match handler {
            HandlerKind::OpenThread => self.open_thread(&entity, cancel).await,
            HandlerKind::EditOpening => self.refresh_opening(&entity, cancel).await,
            HandlerKind::PostStatus { refresh_opening } => {
                self.post_status(event, &entity, refresh_opening, cancel)
                    .await
            }
            HandlerKind::PostReply => self.post_reply(event, &entity, cancel).await,
            HandlerKind::EditReply => self.edit_reply(event, &entity, cancel).await,
            HandlerKind::PostTombstone => self.post_tombstone(event, &entity, cancel).await,
        }
    }

    /// Re-renders the opening message of `entity`'s thread from the given
    /// snapshot.
    pub async fn refresh_opening(
        &self,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let thread = self
            .thread_resolver()
            .find_thread_by_number(entity.entity_ref(), cancel)
            .await?;
        let message = self.edit_opening_in(&thread, entity, cancel).await?;
        Ok(DispatchOutcome::OpeningEdited {
            thread_id: thread.id,
            message_id: message.id,
        })
    }

    fn thread_resolver(&self) -> ThreadResolver<'_> {
        ThreadResolver::new(self.platform.as_ref(), &self.config)
    }

    fn message_resolver(&self) -> MessageResolver<'_> {
        MessageResolver::new(self.platform.as_ref())
    }

    async fn open_thread(
        &self,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let entity_ref = entity.entity_ref();
        if let Some(existing) = self
            .thread_resolver()
            .probe_thread_by_number(entity_ref, cancel)
            .await?
        {
            match self.config.open_conflict_policy {
                OpenConflictPolicy::Reject => {
                    return Err(SyncError::AlreadyExists {
                        entity: entity_ref,
                        thread_id: existing.id,
                    });
                }
                OpenConflictPolicy::ForceProceed => {
                    tracing::warn!(
                        entity = %entity_ref,
                        existing_thread_id = %existing.id,
                        "override enabled; creating duplicate thread"
                    );
                }
            }
        }

        let request = StartThreadRequest {
            name: encode_thread_name(entity.number, &entity.title),
            auto_archive_duration: THREAD_AUTO_ARCHIVE_WEEK,
            thread_type: PUBLIC_THREAD_TYPE,
        };
        let thread = guarded(
            entity_ref,
            "start thread",
            cancel,
            self.platform
                .start_thread(&self.config.parent_channel_id, &request),
        )
        .await?;
        tracing::info!(entity = %entity_ref, thread_id = %thread.id, name = %request.name, "thread created");

        let embed = opening_embed(entity, &self.config.color_scheme);
        let message = guarded(
            entity_ref,
            "create opening message",
            cancel,
            self.platform.send_embed(&thread.id, &embed),
        )
        .await?;
        tracing::info!(entity = %entity_ref, thread_id = %thread.id, message_id = %message.id, "opening message posted");
        Ok(DispatchOutcome::ThreadCreated {
            thread_id: thread.id,
            message_id: message.id,
        })
    }

    async fn edit_opening_in(
        &self,
        thread: &DiscordThread,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DiscordMessage, SyncError> {
        let entity_ref = entity.entity_ref();
        let opening = self
            .message_resolver()
            .find_opening_message(&thread.id, entity_ref, cancel)
            .await?;
        let embed = opening_embed(entity, &self.config.color_scheme);
        let message = guarded(
            entity_ref,
            "edit opening message",
            cancel,
            self.platform.edit_embed(&thread.id, &opening.id, &embed),
        )
        .await?;
        tracing::info!(entity = %entity_ref, thread_id = %thread.id, message_id = %message.id, "opening message refreshed");
        Ok(message)
    }

    async fn post_status(
        &self,
        event: &SyncEvent,
        entity: &Entity,
        refresh_opening: bool,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let entity_ref = entity.entity_ref();
        let thread = self
            .thread_resolver()
            .find_thread_by_number(entity_ref, cancel)
            .await?;
        let embed = status_embed(event, entity, &self.config.color_scheme);
        let message = guarded(
            entity_ref,
            "create status message",
            cancel,
            self.platform.send_embed(&thread.id, &embed),
        )
        .await?;
        tracing::info!(
            entity = %entity_ref,
            action = %event.action,
            thread_id = %thread.id,
            message_id = %message.id,
            "status message posted"
        );
        if refresh_opening {
            self.edit_opening_in(&thread, entity, cancel).await?;
        }
        Ok(DispatchOutcome::StatusPosted {
            thread_id: thread.id,
            message_id: message.id,
            opening_refreshed: refresh_opening,
        })
    }

    async fn post_reply(
        &self,
        event: &SyncEvent,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let entity_ref = entity.entity_ref();
        let subject = event.reply_subject()?;
        let correlation_id = subject.correlation_id();
        let embed = reply_embed(event, entity, subject, &self.config.color_scheme);
        let thread = self
            .thread_resolver()
            .find_thread_by_number(entity_ref, cancel)
            .await?;
        let message = guarded(
            entity_ref,
            "create reply message",
            cancel,
            self.platform.send_embed(&thread.id, &embed),
        )
        .await?;
        tracing::info!(
            entity = %entity_ref,
            subject = subject.label(),
            ?correlation_id,
            thread_id = %thread.id,
            message_id = %message.id,
            "reply posted"
        );
        Ok(DispatchOutcome::ReplyPosted {
            thread_id: thread.id,
            message_id: message.id,
            correlation_id,
        })
    }

    async fn edit_reply(
        &self,
        event: &SyncEvent,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let entity_ref = entity.entity_ref();
        let subject = event.reply_subject()?;
        let correlation_id = subject.correlation_id().ok_or_else(|| {
            SyncError::malformed(
                Some(entity_ref),
                format!("{} has no id to correlate by", subject.label()),
            )
        })?;
        let embed = reply_embed(event, entity, subject, &self.config.color_scheme);
        let thread = self
            .thread_resolver()
            .find_thread_by_number(entity_ref, cancel)
            .await?;
        let previous = self
            .message_resolver()
            .find_message_by_correlation(
                &thread.id,
                entity_ref,
                correlation_id,
                ScanDirection::NewestFirst,
                cancel,
            )
            .await?;
        let message = guarded(
            entity_ref,
            "edit reply message",
            cancel,
            self.platform.edit_embed(&thread.id, &previous.id, &embed),
        )
        .await?;
        tracing::info!(
            entity = %entity_ref,
            subject = subject.label(),
            correlation_id,
            thread_id = %thread.id,
            message_id = %message.id,
            "reply edited"
        );
        Ok(DispatchOutcome::ReplyEdited {
            thread_id: thread.id,
            message_id: message.id,
            correlation_id,
        })
    }

    async fn post_tombstone(
        &self,
        event: &SyncEvent,
        entity: &Entity,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, SyncError> {
        let entity_ref = entity.entity_ref();
        let subject = event.reply_subject()?;
        let correlation_id = subject.correlation_id();
        let embed = tombstone_embed(event, entity, subject, &self.config.color_scheme);
        let thread = self
            .thread_resolver()
            .find_thread_by_number(entity_ref, cancel)
            .await?;
        let message = guarded(
            entity_ref,
            "create tombstone message",
            cancel,
            self.platform.send_embed(&thread.id, &embed),
        )
        .await?;
        tracing::info!(
            entity = %entity_ref,
            subject = subject.label(),
            ?correlation_id,
            thread_id = %thread.id,
            message_id = %message.id,
            "tombstone posted"
        );
        Ok(DispatchOutcome::TombstonePosted {
            thread_id: thread.id,
            message_id: message.id,
            correlation_id,
        })
    }
}

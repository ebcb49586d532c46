//! The threadline sync engine.
//!
//! Mirrors GitHub issue and pull request activity into Discord threads with
//! no local state: thread names and embed titles/footers carry the ids needed
//! to find earlier messages again.

pub mod color_scheme;
pub mod correlation;
pub mod dispatch_table;
pub mod embed_factory;
pub mod event_dispatcher;
pub mod event_model;
pub mod markdown;
pub mod message_resolver;
pub mod sync_config;
pub mod sync_error;
pub mod thread_resolver;

#[cfg(test)]
mod test_support;

pub use color_scheme::{ColorPair, ColorScheme, Tone};
pub use dispatch_table::{route, HandlerKind};
pub use event_dispatcher::{DispatchOutcome, EventDispatcher};
pub use event_model::{
    Entity, EntityKind, EntityRef, EventAction, EventKind, RawEvent, ReplySubject, SyncEvent,
};
pub use message_resolver::{MessageResolver, ScanDirection};
pub use sync_config::{OpenConflictPolicy, SyncConfig, ThreadLookupPolicy};
pub use sync_error::{LookupTarget, SyncError};
pub use thread_resolver::ThreadResolver;

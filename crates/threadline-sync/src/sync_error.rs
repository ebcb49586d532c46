use std::fmt;

use thiserror::Error;

use crate::event_model::EntityRef;

/// What a failed resolution was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    Thread,
    OpeningMessage,
    Reply { correlation_id: u64 },
}

impl fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread => f.write_str("thread"),
            Self::OpeningMessage => f.write_str("opening message"),
            Self::Reply { correlation_id } => write!(f, "message for id {correlation_id}"),
        }
    }
}

#[derive(Debug, Error)]
/// Failure modes of a single sync operation.
pub enum SyncError {
    #[error("{entity}: no {target} found")]
    NotFound {
        entity: EntityRef,
        target: LookupTarget,
    },
    #[error("{entity}: thread {thread_id} already exists")]
    AlreadyExists { entity: EntityRef, thread_id: String },
    #[error("{entity}: {operation} failed: {source:#}")]
    Transport {
        entity: EntityRef,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed event{}: {reason}", entity_suffix(.entity))]
    Malformed {
        entity: Option<EntityRef>,
        reason: String,
    },
    #[error("{entity}: cancelled during {operation}")]
    Cancelled {
        entity: EntityRef,
        operation: &'static str,
    },
}

fn entity_suffix(entity: &Option<EntityRef>) -> String {
    entity
        .map(|entity| format!(" for {entity}"))
        .unwrap_or_default()
}

impl SyncError {
    pub fn not_found(entity: EntityRef, target: LookupTarget) -> Self {
        Self::NotFound { entity, target }
    }

    pub fn transport(entity: EntityRef, operation: &'static str, source: anyhow::Error) -> Self {
        Self::Transport {
            entity,
            operation,
            source,
        }
    }

    pub fn malformed(entity: Option<EntityRef>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            entity,
            reason: reason.into(),
        }
    }

    pub fn cancelled(entity: EntityRef, operation: &'static str) -> Self {
        Self::Cancelled { entity, operation }
    }

    /// `NotFound` and `AlreadyExists` describe the platform state, not a
    /// failure that retrying the same event could fix.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AlreadyExists { .. })
    }
}

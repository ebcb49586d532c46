use std::time::Duration;

use crate::color_scheme::ColorScheme;

pub const DEFAULT_THREAD_LOOKUP_ATTEMPTS: usize = 10;
pub const DEFAULT_THREAD_LOOKUP_DELAY: Duration = Duration::from_secs(10);

/// What "opened" does when a thread for the entity already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenConflictPolicy {
    #[default]
    Reject,
    ForceProceed,
}

/// Bounded wait for a thread that may not be listed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadLookupPolicy {
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for ThreadLookupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_THREAD_LOOKUP_ATTEMPTS,
            retry_delay: DEFAULT_THREAD_LOOKUP_DELAY,
        }
    }
}

impl ThreadLookupPolicy {
    /// Upper bound on time spent sleeping between scans.
    pub fn max_wait(&self) -> Duration {
        let waits = self.max_attempts.max(1).saturating_sub(1) as u32;
        self.retry_delay.saturating_mul(waits)
    }
}

/// Immutable per-invocation settings shared by every sync operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub parent_channel_id: String,
    /// Skips the channel lookup when set.
    pub guild_id: Option<String>,
    pub open_conflict_policy: OpenConflictPolicy,
    pub thread_lookup: ThreadLookupPolicy,
    pub color_scheme: ColorScheme,
}

impl SyncConfig {
    pub fn new(parent_channel_id: impl Into<String>) -> Self {
        Self {
            parent_channel_id: parent_channel_id.into(),
            guild_id: None,
            open_conflict_policy: OpenConflictPolicy::default(),
            thread_lookup: ThreadLookupPolicy::default(),
            color_scheme: ColorScheme::default(),
        }
    }
}

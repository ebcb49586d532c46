//! Discord side of threadline: REST model types, the `ChatPlatform` seam used
//! by the sync engine, and the reqwest-backed Discord client.

pub mod chat_platform;
pub mod discord_api_client;
pub mod discord_types;

pub use chat_platform::{ArchivedThreadsPage, ChatPlatform, MessageCursor, StartThreadRequest};
pub use discord_api_client::{DiscordApiClient, DISCORD_API_BASE};
pub use discord_types::{
    compare_snowflakes, DiscordChannel, DiscordMessage, DiscordThread, Embed, EmbedAuthor,
    EmbedField, EmbedFooter, ThreadMetadata, PUBLIC_THREAD_TYPE, THREAD_AUTO_ARCHIVE_WEEK,
};

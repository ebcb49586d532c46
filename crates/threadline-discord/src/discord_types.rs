//! Serde model for the subset of Discord REST objects threadline touches.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Channel type id of a public thread (`GUILD_PUBLIC_THREAD`).
pub const PUBLIC_THREAD_TYPE: u8 = 11;
/// Auto-archive window in minutes (7 days).
pub const THREAD_AUTO_ARCHIVE_WEEK: u32 = 10_080;

/// Orders Discord snowflake ids numerically, falling back to lexical order for
/// ids that do not parse.
pub fn compare_snowflakes(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<u128>(), right.trim().parse::<u128>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// A thread channel. Only the fields used for name-based lookup are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordThread {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_metadata: Option<ThreadMetadata>,
}

impl DiscordThread {
    pub fn archived(&self) -> bool {
        self.thread_metadata
            .as_ref()
            .map(|metadata| metadata.archived)
            .unwrap_or(false)
    }

    pub fn archive_timestamp(&self) -> Option<&str> {
        self.thread_metadata
            .as_ref()
            .and_then(|metadata| metadata.archive_timestamp.as_deref())
    }

    pub fn has_parent(&self, parent_id: &str) -> bool {
        self.parent_id.as_deref() == Some(parent_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

impl DiscordMessage {
    /// The message's embed when it carries exactly one; the sync engine never
    /// writes multi-embed messages, so anything else is foreign content.
    pub fn single_embed(&self) -> Option<&Embed> {
        match self.embeds.as_slice() {
            [embed] => Some(embed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    pub fn footer_text(&self) -> Option<&str> {
        self.footer.as_ref().map(|footer| footer.text.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

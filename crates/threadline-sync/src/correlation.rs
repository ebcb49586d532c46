//! Encoding of entity numbers and correlation ids into platform content.
//!
//! Threads are found by name, opening messages by embed title, and replies by
//! embed footer. Every encoder here has a decoder that accepts exactly what the
//! encoder writes (plus the legacy `#N` thread prefix).

use std::sync::OnceLock;

use regex::Regex;

use crate::event_model::EntityKind;

/// Discord rejects thread names longer than this.
pub const THREAD_NAME_MAX_CHARS: usize = 100;
/// Discord rejects embed titles longer than this.
pub const EMBED_TITLE_MAX_CHARS: usize = 256;

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// `"N: title"`, clipped to the thread-name limit.
pub fn encode_thread_name(number: u64, title: &str) -> String {
    let title = title.trim();
    let name = if title.is_empty() {
        number.to_string()
    } else {
        format!("{number}: {title}")
    };
    truncate_chars(&name, THREAD_NAME_MAX_CHARS)
}

/// Entity number a thread name refers to. The whole leading digit run is the
/// number, so `"10: ..."` never decodes as 1.
pub fn decode_thread_number(name: &str) -> Option<u64> {
    let name = name.trim_start();
    let name = name.strip_prefix('#').unwrap_or(name);
    let digits_end = name
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(name.len());
    if digits_end == 0 {
        return None;
    }
    name[..digits_end].parse().ok()
}

pub fn thread_name_matches(name: &str, number: u64) -> bool {
    decode_thread_number(name) == Some(number)
}

pub fn encode_opening_title(kind: EntityKind, number: u64, title: &str) -> String {
    let encoded = format!("{} opened: #{number} {}", kind.noun(), title.trim());
    truncate_chars(encoded.trim_end(), EMBED_TITLE_MAX_CHARS)
}

fn opening_title_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?:Issue|Pull request) opened: #(\d+)(?:\s|$)").ok())
        .as_ref()
}

pub fn decode_opening_number(title: &str) -> Option<u64> {
    let captures = opening_title_pattern()?.captures(title)?;
    captures.get(1)?.as_str().parse().ok()
}

pub fn encode_footer(correlation_id: u64) -> String {
    correlation_id.to_string()
}

/// Only the canonical decimal form decodes: no sign, no leading zeros, no
/// `0x` prefix.
pub fn decode_footer(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let value = trimmed.parse::<u64>().ok()?;
    (value.to_string() == trimmed).then_some(value)
}

//! GitHub-flavored markdown to Discord embed text.
//!
//! Discord renders most markdown itself, so conversion only rewrites the
//! constructs it does not understand and enforces the length limits.

use std::sync::OnceLock;

use regex::Regex;

/// Discord's embed description limit.
pub const DESCRIPTION_MAX_CHARS: usize = 4096;
/// Discord's embed field value limit.
pub const FIELD_VALUE_MAX_CHARS: usize = 1024;
const TRUNCATION_MARK: &str = "…";

struct Rewrites {
    html_comment: Regex,
    checked_task: Regex,
    open_task: Regex,
    autolink: Regex,
    blank_runs: Regex,
}

fn rewrites() -> Option<&'static Rewrites> {
    static REWRITES: OnceLock<Option<Rewrites>> = OnceLock::new();
    REWRITES
        .get_or_init(|| {
            Some(Rewrites {
                html_comment: Regex::new(r"(?s)<!--.*?-->").ok()?,
                checked_task: Regex::new(r"(?m)^(\s*[-*+]\s+)\[[xX]\]").ok()?,
                open_task: Regex::new(r"(?m)^(\s*[-*+]\s+)\[ \]").ok()?,
                autolink: Regex::new(r"<(https?://[^>\s]+)>").ok()?,
                blank_runs: Regex::new(r"\n{3,}").ok()?,
            })
        })
        .as_ref()
}

/// `[text](href)`, or the bare text when there is nothing to link to.
pub fn hyperlink(text: &str, href: &str) -> String {
    if href.trim().is_empty() {
        return text.to_string();
    }
    format!("[{text}]({href})")
}

pub fn convert(markdown: &str) -> String {
    let normalized = markdown.replace("\r\n", "\n");
    let Some(rewrites) = rewrites() else {
        return normalized.trim().to_string();
    };
    let text = rewrites.html_comment.replace_all(&normalized, "");
    let text = rewrites.checked_task.replace_all(&text, "${1}☑");
    let text = rewrites.open_task.replace_all(&text, "${1}☐");
    let text = rewrites.autolink.replace_all(&text, "$1");
    let text = rewrites.blank_runs.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Clips `text` to `max_chars`, cutting at the last space that leaves room for
/// the suffix.
pub fn truncate(text: &str, suffix: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(suffix.chars().count());
    let head = text.chars().take(budget).collect::<String>();
    let cut = match head.rfind(char::is_whitespace) {
        Some(index) if index > 0 => &head[..index],
        _ => head.as_str(),
    };
    format!("{}{suffix}", cut.trim_end())
}

fn read_more_suffix(read_more_url: &str) -> String {
    if read_more_url.trim().is_empty() {
        TRUNCATION_MARK.to_string()
    } else {
        format!("{TRUNCATION_MARK} {}", hyperlink("Read more", read_more_url))
    }
}

/// Embed description text: converted, then clipped with a "Read more" link.
pub fn render_description(markdown: &str, read_more_url: &str) -> String {
    truncate(
        &convert(markdown),
        &read_more_suffix(read_more_url),
        DESCRIPTION_MAX_CHARS,
    )
}

pub fn render_field_value(markdown: &str, read_more_url: &str) -> String {
    let rendered = truncate(
        &convert(markdown),
        &read_more_suffix(read_more_url),
        FIELD_VALUE_MAX_CHARS,
    );
    // Discord rejects empty field values.
    if rendered.is_empty() {
        "\u{200b}".to_string()
    } else {
        rendered
    }
}

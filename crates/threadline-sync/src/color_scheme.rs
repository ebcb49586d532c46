//! Embed colors keyed by event kind and action.
//!
//! Overrides come from a TOML file and are merged over the built-in defaults:
//!
//! ```toml
//! [default]
//! success = "#2ecc71"
//!
//! [colors."issues.closed"]
//! error = "0x992d22"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::event_model::{EventAction, EventKind};

pub const DEFAULT_SUCCESS_COLOR: u32 = 0x00FF00;
pub const DEFAULT_ERROR_COLOR: u32 = 0xFF0000;
const MAX_COLOR: u32 = 0xFF_FFFF;

/// Whether an embed reports something constructive or destructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub success: u32,
    pub error: u32,
}

impl Default for ColorPair {
    fn default() -> Self {
        Self {
            success: DEFAULT_SUCCESS_COLOR,
            error: DEFAULT_ERROR_COLOR,
        }
    }
}

impl ColorPair {
    pub fn pick(&self, tone: Tone) -> u32 {
        match tone {
            Tone::Success => self.success,
            Tone::Error => self.error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorScheme {
    default: ColorPair,
    overrides: HashMap<(EventKind, EventAction), ColorPair>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorOverride {
    #[serde(default)]
    success: Option<ColorValue>,
    #[serde(default)]
    error: Option<ColorValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorSchemeFile {
    #[serde(default)]
    default: Option<ColorOverride>,
    #[serde(default)]
    colors: BTreeMap<String, ColorOverride>,
}

impl ColorScheme {
    pub fn color(&self, kind: EventKind, action: &EventAction, tone: Tone) -> u32 {
        self.overrides
            .get(&(kind, action.clone()))
            .unwrap_or(&self.default)
            .pick(tone)
    }

    pub fn set(&mut self, kind: EventKind, action: EventAction, pair: ColorPair) {
        self.overrides.insert((kind, action), pair);
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read color scheme {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid color scheme {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ColorSchemeFile = toml::from_str(raw).context("failed to parse toml")?;
        let mut scheme = Self::default();
        if let Some(default) = file.default.as_ref() {
            scheme.default = merge_override(scheme.default, default)?;
        }
        for (key, entry) in &file.colors {
            let (kind, action) = parse_color_key(key)?;
            let slot = (kind, action);
            if scheme.overrides.contains_key(&slot) {
                tracing::warn!(key = %key, "color override repeats an earlier key; last one wins");
            }
            let base = scheme.default;
            scheme.overrides.insert(slot, merge_override(base, entry)?);
        }
        Ok(scheme)
    }
}

fn merge_override(base: ColorPair, entry: &ColorOverride) -> Result<ColorPair> {
    Ok(ColorPair {
        success: match entry.success.as_ref() {
            Some(value) => parse_color_value(value)?,
            None => base.success,
        },
        error: match entry.error.as_ref() {
            Some(value) => parse_color_value(value)?,
            None => base.error,
        },
    })
}

fn parse_color_key(key: &str) -> Result<(EventKind, EventAction)> {
    let (kind, action) = key
        .split_once('.')
        .ok_or_else(|| anyhow!("color key '{key}' must be '<event>.<action>'"))?;
    let kind = EventKind::parse(kind)
        .ok_or_else(|| anyhow!("color key '{key}' names an unsupported event '{kind}'"))?;
    let action = action.trim();
    if action.is_empty() {
        bail!("color key '{key}' has an empty action");
    }
    Ok((kind, EventAction::parse(action)))
}

fn parse_color_value(value: &ColorValue) -> Result<u32> {
    let parsed = match value {
        ColorValue::Number(number) => *number,
        ColorValue::Text(text) => {
            let trimmed = text.trim();
            let digits = trimmed
                .strip_prefix('#')
                .or_else(|| trimmed.strip_prefix("0x"))
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            u32::from_str_radix(digits, 16)
                .with_context(|| format!("invalid color '{text}', expected hex like #00ff00"))?
        }
    };
    if parsed > MAX_COLOR {
        bail!("color {parsed:#x} exceeds 0xffffff");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{ColorScheme, Tone, DEFAULT_ERROR_COLOR, DEFAULT_SUCCESS_COLOR};
    use crate::event_model::{EventAction, EventKind};

    #[test]
    fn unit_default_scheme_uses_green_and_red() {
        let scheme = ColorScheme::default();
        assert_eq!(
            scheme.color(EventKind::Issues, &EventAction::Opened, Tone::Success),
            DEFAULT_SUCCESS_COLOR
        );
        assert_eq!(
            scheme.color(EventKind::IssueComment, &EventAction::Deleted, Tone::Error),
            DEFAULT_ERROR_COLOR
        );
    }

    #[test]
    fn functional_toml_overrides_merge_over_defaults() {
        let scheme = ColorScheme::from_toml_str(
            r##"
            [default]
            success = "#123456"

            [colors."issues.closed"]
            error = "0x654321"

            [colors."PullRequestEvent.opened"]
            success = 255
            "##,
        )
        .expect("scheme");

        assert_eq!(
            scheme.color(EventKind::Issues, &EventAction::Labeled, Tone::Success),
            0x123456
        );
        assert_eq!(
            scheme.color(EventKind::Issues, &EventAction::Closed, Tone::Success),
            0x123456
        );
        assert_eq!(
            scheme.color(EventKind::Issues, &EventAction::Closed, Tone::Error),
            0x654321
        );
        assert_eq!(
            scheme.color(EventKind::PullRequest, &EventAction::Opened, Tone::Success),
            255
        );
        assert_eq!(
            scheme.color(EventKind::PullRequest, &EventAction::Opened, Tone::Error),
            DEFAULT_ERROR_COLOR
        );
    }

    #[test]
    fn regression_invalid_keys_and_values_are_rejected() {
        let error = ColorScheme::from_toml_str("[colors.\"push.created\"]\nsuccess = 1\n")
            .expect_err("unknown event");
        assert!(format!("{error:#}").contains("unsupported event 'push'"));

        let error = ColorScheme::from_toml_str("[colors.\"issues\"]\nsuccess = 1\n")
            .expect_err("missing action");
        assert!(format!("{error:#}").contains("<event>.<action>"));

        let error = ColorScheme::from_toml_str("[default]\nsuccess = \"#zzzzzz\"\n")
            .expect_err("bad hex");
        assert!(format!("{error:#}").contains("invalid color"));

        let error = ColorScheme::from_toml_str("[default]\nsuccess = 16777216\n")
            .expect_err("too large");
        assert!(format!("{error:#}").contains("exceeds 0xffffff"));
    }

    #[test]
    fn functional_load_reads_scheme_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[colors.\"issue_comment.created\"]\nsuccess = \"#0000ff\"")
            .expect("write");
        let scheme = ColorScheme::load(file.path()).expect("load");
        assert_eq!(
            scheme.color(EventKind::IssueComment, &EventAction::Created, Tone::Success),
            0x0000ff
        );
    }
}

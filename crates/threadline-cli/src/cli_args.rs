use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use threadline_discord::DISCORD_API_BASE;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "threadline",
    about = "Mirror GitHub issue and pull request activity into Discord threads",
    version
)]
pub struct Cli {
    #[arg(
        long = "github-repo",
        env = "GITHUB_REPOSITORY",
        help = "Repository in owner/name form"
    )]
    pub github_repo: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        default_value = "",
        hide_env_values = true,
        help = "GitHub token; anonymous requests are used when empty"
    )]
    pub github_token: String,

    #[arg(
        long = "github-api-base",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "GitHub REST API base URL"
    )]
    pub github_api_base: String,

    #[arg(
        long = "discord-token",
        env = "DISCORD_TOKEN",
        hide_env_values = true,
        help = "Discord bot token"
    )]
    pub discord_token: String,

    #[arg(
        long = "discord-channel-id",
        env = "DISCORD_CHANNEL_ID",
        help = "Parent channel that holds one thread per issue or pull request"
    )]
    pub discord_channel_id: String,

    #[arg(
        long = "discord-guild-id",
        env = "DISCORD_GUILD_ID",
        help = "Guild of the parent channel; looked up from the channel when omitted"
    )]
    pub discord_guild_id: Option<String>,

    #[arg(
        long = "discord-api-base",
        env = "DISCORD_API_URL",
        default_value = DISCORD_API_BASE,
        help = "Discord REST API base URL"
    )]
    pub discord_api_base: String,

    #[arg(
        long = "force-open",
        env = "THREADLINE_FORCE_OPEN",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Create a thread on 'opened' even when one already exists for the number"
    )]
    pub force_open: bool,

    #[arg(
        long = "color-scheme",
        env = "THREADLINE_COLOR_SCHEME",
        help = "TOML file with per-event embed color overrides"
    )]
    pub color_scheme: Option<PathBuf>,

    #[arg(
        long = "thread-lookup-attempts",
        default_value_t = 10,
        value_parser = parse_positive_usize,
        help = "Thread listing scans before giving up on a thread that is not visible yet"
    )]
    pub thread_lookup_attempts: usize,

    #[arg(
        long = "thread-lookup-delay-ms",
        default_value_t = 10_000,
        help = "Delay between thread listing scans"
    )]
    pub thread_lookup_delay_ms: u64,

    #[arg(
        long = "request-timeout-ms",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Per-request HTTP timeout for GitHub and Discord"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "HTTP attempts per request for retryable failures"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        default_value_t = 500,
        help = "Base delay for exponential HTTP retry backoff"
    )]
    pub retry_base_delay_ms: u64,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Sync one event delivered as a JSON payload file.
    Dispatch {
        #[arg(long = "event-name", env = "GITHUB_EVENT_NAME")]
        event_name: String,
        #[arg(long = "event-path", env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,
    },
    /// Fetch an event from the repository Events API by id and sync it.
    EventId { event_id: String },
    /// Re-render the opening message of an issue or pull request from its
    /// current REST state.
    Refresh {
        #[arg(value_parser = parse_positive_u64)]
        number: u64,
    },
}

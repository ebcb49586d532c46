use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use threadline_core::{CancelHandle, CancelSignal};
use threadline_discord::DiscordApiClient;
use threadline_github::{GithubApiClient, RepoRef};
use threadline_sync::{
    ColorScheme, DispatchOutcome, Entity, EventAction, EventDispatcher, EventKind,
    OpenConflictPolicy, RawEvent, SyncConfig, SyncError, SyncEvent, ThreadLookupPolicy,
};

use crate::cli_args::{Cli, CliCommand};

/// Clients and engine built once per invocation.
pub(crate) struct RunContext {
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) github: GithubApiClient,
}

pub(crate) fn build_sync_config(cli: &Cli) -> Result<SyncConfig> {
    let parent_channel_id = cli.discord_channel_id.trim();
    if parent_channel_id.is_empty() {
        bail!("--discord-channel-id must not be empty");
    }
    let color_scheme = match cli.color_scheme.as_deref() {
        Some(path) => ColorScheme::load(path)?,
        None => ColorScheme::default(),
    };
    Ok(SyncConfig {
        parent_channel_id: parent_channel_id.to_string(),
        guild_id: cli
            .discord_guild_id
            .as_deref()
            .map(str::trim)
            .filter(|guild_id| !guild_id.is_empty())
            .map(ToOwned::to_owned),
        open_conflict_policy: if cli.force_open {
            OpenConflictPolicy::ForceProceed
        } else {
            OpenConflictPolicy::Reject
        },
        thread_lookup: ThreadLookupPolicy {
            max_attempts: cli.thread_lookup_attempts,
            retry_delay: Duration::from_millis(cli.thread_lookup_delay_ms),
        },
        color_scheme,
    })
}

pub(crate) fn build_context(cli: &Cli) -> Result<RunContext> {
    let config = build_sync_config(cli)?;
    let repo = RepoRef::parse(&cli.github_repo)?;
    let github = GithubApiClient::new(
        cli.github_api_base.clone(),
        cli.github_token.clone(),
        repo,
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )?;
    let discord = DiscordApiClient::new(
        cli.discord_api_base.clone(),
        cli.discord_token.clone(),
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )?;
    Ok(RunContext {
        dispatcher: EventDispatcher::new(Arc::new(discord), Arc::new(config)),
        github,
    })
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let context = build_context(&cli)?;
    let (handle, cancel) = CancelSignal::channel();
    spawn_ctrl_c_watcher(handle);

    let outcome = execute(&context, &cli.command, &cancel).await?;
    tracing::info!(repo = %context.github.repo(), ?outcome, "sync finished");
    Ok(())
}

fn spawn_ctrl_c_watcher(handle: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling sync");
            handle.cancel();
        }
    });
}

pub(crate) async fn execute(
    context: &RunContext,
    command: &CliCommand,
    cancel: &CancelSignal,
) -> Result<DispatchOutcome> {
    match command {
        CliCommand::Dispatch {
            event_name,
            event_path,
        } => {
            let raw = load_raw_event(event_name, event_path).await?;
            settled(context.dispatcher.dispatch_event(&raw, cancel).await)
        }
        CliCommand::EventId { event_id } => {
            let event = context
                .github
                .find_event_by_id(event_id)
                .await?
                .ok_or_else(|| {
                    anyhow!(
                        "event {event_id} not found in recent events of {}",
                        context.github.repo()
                    )
                })?;
            let mut decoded = SyncEvent::from_repository_event(&event)?;
            refresh_comment(&context.github, &mut decoded).await;
            settled(context.dispatcher.dispatch(&decoded, cancel).await)
        }
        CliCommand::Refresh { number } => {
            let entity = fetch_entity(&context.github, *number).await?;
            settled(context.dispatcher.refresh_opening(&entity, cancel).await)
        }
    }
}

/// Terminal errors mean Discord already disagrees with the event; rerunning
/// the same event will fail the same way.
fn settled(result: Result<DispatchOutcome, SyncError>) -> Result<DispatchOutcome> {
    result.map_err(|error| {
        if error.is_terminal() {
            tracing::warn!(error = %error, "event conflicts with Discord state; rerun will not help");
        }
        anyhow::Error::new(error)
    })
}

pub(crate) async fn load_raw_event(event_name: &str, event_path: &Path) -> Result<RawEvent> {
    let raw = tokio::fs::read_to_string(event_path)
        .await
        .with_context(|| format!("failed to read event payload {}", event_path.display()))?;
    let payload = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event payload {}", event_path.display()))?;
    Ok(RawEvent::new(event_name.trim(), payload))
}

/// Events API entries can lag behind the comment they describe; reactions in
/// particular are only current on the REST resource.
async fn refresh_comment(github: &GithubApiClient, event: &mut SyncEvent) {
    if event.kind != EventKind::IssueComment || event.action == EventAction::Deleted {
        return;
    }
    let Some(comment_id) = event.payload.comment.as_ref().map(|comment| comment.id) else {
        return;
    };
    match github.get_issue_comment(comment_id).await {
        Ok(comment) => event.payload.comment = Some(comment),
        Err(error) => {
            tracing::warn!(comment_id, error = %format!("{error:#}"), "keeping event copy of comment");
        }
    }
}

/// Issues and pull requests share a number space; the issues endpoint tells
/// which one `number` is.
async fn fetch_entity(github: &GithubApiClient, number: u64) -> Result<Entity> {
    let issue = github.get_issue(number).await?;
    if issue.is_pull_request() {
        let pull = github.get_pull_request(number).await?;
        Ok(Entity::from_pull_request(&pull))
    } else {
        Ok(Entity::from_issue(&issue))
    }
}

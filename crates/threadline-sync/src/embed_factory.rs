//! Pure constructors for every embed threadline posts.
//!
//! Opening embeds encode the entity number in the title and reply embeds
//! encode their correlation id in the footer; see [`crate::correlation`].

use threadline_discord::{Embed, EmbedAuthor, EmbedField, EmbedFooter};
use threadline_github::{
    GithubComment, GithubReactions, GithubReview, GithubReviewThread, GithubTeam, GithubUser,
};

use crate::color_scheme::{ColorScheme, Tone};
use crate::correlation::{encode_footer, encode_opening_title, EMBED_TITLE_MAX_CHARS};
use crate::event_model::{Entity, EntityKind, EventAction, EventKind, ReplySubject, SyncEvent};
use crate::markdown::{hyperlink, render_description, render_field_value, FIELD_VALUE_MAX_CHARS};

fn author(user: &GithubUser) -> Option<EmbedAuthor> {
    if user.login.trim().is_empty() {
        return None;
    }
    Some(EmbedAuthor {
        name: user.login.clone(),
        url: non_empty(&user.html_url),
        icon_url: non_empty(&user.avatar_url),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value: clip_field(value),
        inline: false,
    }
}

fn clip_field(value: String) -> String {
    if value.chars().count() <= FIELD_VALUE_MAX_CHARS {
        return value;
    }
    let mut clipped = value
        .chars()
        .take(FIELD_VALUE_MAX_CHARS.saturating_sub(1))
        .collect::<String>();
    clipped.push('…');
    clipped
}

fn clip_title(title: String) -> String {
    if title.chars().count() <= EMBED_TITLE_MAX_CHARS {
        return title;
    }
    title.chars().take(EMBED_TITLE_MAX_CHARS).collect()
}

fn user_links(users: &[GithubUser]) -> String {
    users
        .iter()
        .map(|user| hyperlink(&user.login, &user.html_url))
        .collect::<Vec<_>>()
        .join(", ")
}

fn team_links(teams: &[GithubTeam]) -> String {
    teams
        .iter()
        .map(|team| hyperlink(&team.name, &team.html_url))
        .collect::<Vec<_>>()
        .join(", ")
}

fn opening_event_kind(kind: EntityKind) -> EventKind {
    match kind {
        EntityKind::Issue => EventKind::Issues,
        EntityKind::PullRequest => EventKind::PullRequest,
    }
}

fn reaction_fields(reactions: &GithubReactions) -> Vec<EmbedField> {
    [
        ("👍", reactions.plus_one),
        ("👎", reactions.minus_one),
        ("😆", reactions.laugh),
        ("🎉", reactions.hooray),
        ("😕", reactions.confused),
        ("❤️", reactions.heart),
        ("🚀", reactions.rocket),
        ("👀", reactions.eyes),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(emoji, count)| EmbedField {
        name: emoji.to_string(),
        value: count.to_string(),
        inline: true,
    })
    .collect()
}

/// The live summary message at the top of an entity's thread.
pub fn opening_embed(entity: &Entity, colors: &ColorScheme) -> Embed {
    let mut fields = Vec::new();
    if !entity.status.trim().is_empty() {
        fields.push(field("Status", entity.status.clone()));
    }
    if !entity.labels.is_empty() {
        let names = entity
            .labels
            .iter()
            .map(|label| label.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        fields.push(field("Labels", names));
    }
    if !entity.assignees.is_empty() {
        fields.push(field("Assignees", user_links(&entity.assignees)));
    }
    if !entity.requested_reviewers.is_empty() {
        fields.push(field(
            "Requested reviewers",
            user_links(&entity.requested_reviewers),
        ));
    }
    if !entity.requested_teams.is_empty() {
        fields.push(field("Requested teams", team_links(&entity.requested_teams)));
    }
    if let Some(milestone) = entity.milestone.as_ref() {
        fields.push(field(
            "Milestone",
            hyperlink(&milestone.title, &milestone.html_url),
        ));
    }
    if entity.locked {
        fields.push(field("Locked", "🔒".to_string()));
    }

    let description = render_description(&entity.body, &entity.html_url);
    Embed {
        title: Some(encode_opening_title(
            entity.kind,
            entity.number,
            &entity.title,
        )),
        description: non_empty(&description),
        url: non_empty(&entity.html_url),
        color: Some(colors.color(
            opening_event_kind(entity.kind),
            &EventAction::Opened,
            Tone::Success,
        )),
        author: author(&entity.author),
        fields,
        footer: None,
    }
}

fn status_headline(event: &SyncEvent, entity: &Entity) -> (String, Tone) {
    let noun = entity.kind.noun();
    let lower_noun = entity.kind.lower_noun();
    let number = entity.number;
    let payload = &event.payload;
    let label = payload
        .label
        .as_ref()
        .map(|label| label.name.as_str())
        .unwrap_or("a");
    let assignee = payload
        .assignee
        .as_ref()
        .map(|user| user.login.as_str())
        .unwrap_or("someone");
    let milestone = payload
        .milestone
        .as_ref()
        .or(entity.milestone.as_ref())
        .map(|milestone| milestone.title.as_str())
        .unwrap_or("a");
    let reviewer = payload
        .requested_reviewer
        .as_ref()
        .map(|user| user.login.clone())
        .or_else(|| payload.requested_team.as_ref().map(|team| team.name.clone()))
        .unwrap_or_else(|| "a reviewer".to_string());

    match &event.action {
        EventAction::Closed => match entity.kind {
            EntityKind::PullRequest if entity.merged => {
                (format!("{noun} #{number} merged"), Tone::Success)
            }
            EntityKind::PullRequest => (format!("{noun} #{number} closed"), Tone::Error),
            EntityKind::Issue => match entity.state_reason.as_deref() {
                Some("not_planned") => (
                    format!("{noun} #{number} closed as not planned"),
                    Tone::Error,
                ),
                Some("completed") => (
                    format!("{noun} #{number} closed as completed"),
                    Tone::Success,
                ),
                _ => (format!("{noun} #{number} closed"), Tone::Success),
            },
        },
        EventAction::Reopened => (format!("{noun} #{number} reopened"), Tone::Success),
        EventAction::Labeled => (
            format!("{noun} #{number}: added {label} label"),
            Tone::Success,
        ),
        EventAction::Unlabeled => (
            format!("{noun} #{number}: removed {label} label"),
            Tone::Success,
        ),
        EventAction::Assigned => (
            format!("{noun} #{number} assigned to {assignee}"),
            Tone::Success,
        ),
        EventAction::Unassigned => (
            format!("{noun} #{number} unassigned from {assignee}"),
            Tone::Success,
        ),
        EventAction::Locked => (format!("{noun} #{number} locked"), Tone::Success),
        EventAction::Unlocked => (format!("{noun} #{number} unlocked"), Tone::Success),
        EventAction::Milestoned => (
            format!("{noun} #{number}: {milestone} milestone added"),
            Tone::Success,
        ),
        EventAction::Demilestoned => (
            format!("{noun} #{number}: {milestone} milestone removed"),
            Tone::Success,
        ),
        EventAction::Deleted => (format!("{noun} #{number} deleted"), Tone::Error),
        EventAction::Transferred => {
            let changes = payload.changes.as_ref();
            let repository = changes
                .and_then(|changes| changes.new_repository.as_ref())
                .map(|repository| repository.full_name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or("another repository");
            let target = match changes.and_then(|changes| changes.new_issue.as_ref()) {
                Some(issue) if issue.number > 0 => format!("{repository}#{}", issue.number),
                _ => repository.to_string(),
            };
            (
                format!("{noun} #{number} transferred to {target}"),
                Tone::Success,
            )
        }
        EventAction::ReviewRequested => (
            format!("Review requested from {reviewer} for {lower_noun} #{number}"),
            Tone::Success,
        ),
        EventAction::ReviewRequestRemoved => (
            format!("Review request for {reviewer} removed from {lower_noun} #{number}"),
            Tone::Success,
        ),
        EventAction::ReadyForReview => (
            format!("{noun} #{number} is ready for review"),
            Tone::Success,
        ),
        EventAction::ConvertedToDraft => (
            format!("{noun} #{number} converted to draft"),
            Tone::Success,
        ),
        EventAction::Resolved => (
            format!("Review thread resolved on {lower_noun} #{number}"),
            Tone::Success,
        ),
        EventAction::Unresolved => (
            format!("Review thread unresolved on {lower_noun} #{number}"),
            Tone::Success,
        ),
        other => (format!("{noun} #{number} {other}"), Tone::Success),
    }
}

/// An append-only line in the activity log for a lifecycle change.
pub fn status_embed(event: &SyncEvent, entity: &Entity, colors: &ColorScheme) -> Embed {
    let (title, tone) = status_headline(event, entity);
    let url = match event.payload.thread.as_ref() {
        Some(thread) => review_thread_url(thread).or_else(|| non_empty(&entity.html_url)),
        None => non_empty(&entity.html_url),
    };
    Embed {
        title: Some(clip_title(title)),
        url,
        color: Some(colors.color(event.kind, &event.action, tone)),
        author: author(&event.sender()),
        ..Embed::default()
    }
}

fn review_thread_url(thread: &GithubReviewThread) -> Option<String> {
    thread
        .comments
        .first()
        .and_then(|comment| non_empty(&comment.html_url))
}

fn comment_embed(
    comment: &GithubComment,
    title: String,
    kind: EventKind,
    colors: &ColorScheme,
) -> Embed {
    let body = comment.body.as_deref().unwrap_or_default();
    let mut fields = Vec::new();
    if let Some(path) = comment.path.as_deref().filter(|path| !path.is_empty()) {
        fields.push(field("File", format!("`{path}`")));
    }
    fields.extend(reaction_fields(&comment.reactions));
    Embed {
        title: Some(clip_title(title)),
        description: non_empty(&render_description(body, &comment.html_url)),
        url: non_empty(&comment.html_url),
        color: Some(colors.color(kind, &EventAction::Created, Tone::Success)),
        author: author(&comment.user),
        fields,
        footer: Some(EmbedFooter {
            text: encode_footer(comment.id),
        }),
    }
}

fn review_embed(entity: &Entity, review: &GithubReview, colors: &ColorScheme) -> Embed {
    let body = review.body.as_deref().unwrap_or_default();
    let mut fields = Vec::new();
    if !review.state.trim().is_empty() {
        fields.push(field("State", review.state.to_lowercase().replace('_', " ")));
    }
    Embed {
        title: Some(format!(
            "Review submitted on pull request #{}",
            entity.number
        )),
        description: non_empty(&render_description(body, &review.html_url)),
        url: non_empty(&review.html_url),
        color: Some(colors.color(
            EventKind::PullRequestReview,
            &EventAction::Submitted,
            Tone::Success,
        )),
        author: author(&review.user),
        fields,
        footer: Some(EmbedFooter {
            text: encode_footer(review.id),
        }),
    }
}

fn review_thread_embed(
    entity: &Entity,
    thread: &GithubReviewThread,
    sender: &GithubUser,
    colors: &ColorScheme,
) -> Embed {
    let fields = thread
        .comments
        .iter()
        .map(|comment| EmbedField {
            name: format!(
                "{} on review comment {}",
                if comment.user.login.is_empty() {
                    "Reply"
                } else {
                    comment.user.login.as_str()
                },
                comment.id
            ),
            value: render_field_value(
                comment.body.as_deref().unwrap_or_default(),
                &comment.html_url,
            ),
            inline: false,
        })
        .collect();
    Embed {
        title: Some(format!("Review thread on pull request #{}", entity.number)),
        url: review_thread_url(thread),
        color: Some(colors.color(
            EventKind::PullRequestReviewThread,
            &EventAction::Created,
            Tone::Success,
        )),
        author: author(sender),
        fields,
        footer: thread.correlation_id().map(|id| EmbedFooter {
            text: encode_footer(id),
        }),
        ..Embed::default()
    }
}

/// A comment, review, review comment, or review thread message. The footer
/// carries the subject's correlation id; a review thread without a numeric id
/// gets no footer and cannot be edited later.
pub fn reply_embed(
    event: &SyncEvent,
    entity: &Entity,
    subject: ReplySubject<'_>,
    colors: &ColorScheme,
) -> Embed {
    match subject {
        ReplySubject::Comment(comment) => comment_embed(
            comment,
            format!(
                "Comment on {} #{}",
                entity.kind.lower_noun(),
                entity.number
            ),
            EventKind::IssueComment,
            colors,
        ),
        ReplySubject::ReviewComment(comment) => comment_embed(
            comment,
            format!("Review comment on pull request #{}", entity.number),
            EventKind::PullRequestReviewComment,
            colors,
        ),
        ReplySubject::Review(review) => review_embed(entity, review, colors),
        ReplySubject::ReviewThread(thread) => {
            review_thread_embed(entity, thread, &event.sender(), colors)
        }
    }
}

/// Posted when a reply is deleted or dismissed. Carries no footer, so later
/// edits of the same id never land on it.
pub fn tombstone_embed(
    event: &SyncEvent,
    entity: &Entity,
    subject: ReplySubject<'_>,
    colors: &ColorScheme,
) -> Embed {
    let (title, body, url) = match subject {
        ReplySubject::Comment(comment) => (
            format!(
                "Deleted comment on {} #{}",
                entity.kind.lower_noun(),
                entity.number
            ),
            comment.body.clone().unwrap_or_default(),
            comment.html_url.clone(),
        ),
        ReplySubject::ReviewComment(comment) => (
            format!("Review comment deleted on pull request #{}", entity.number),
            comment.body.clone().unwrap_or_default(),
            comment.html_url.clone(),
        ),
        ReplySubject::Review(review) => (
            format!("Review dismissed on pull request #{}", entity.number),
            review.body.clone().unwrap_or_default(),
            review.html_url.clone(),
        ),
        ReplySubject::ReviewThread(thread) => (
            format!("Review thread removed on pull request #{}", entity.number),
            String::new(),
            review_thread_url(thread).unwrap_or_default(),
        ),
    };
    Embed {
        title: Some(clip_title(title)),
        description: non_empty(&render_description(&body, "")),
        url: non_empty(&url),
        color: Some(colors.color(event.kind, &event.action, Tone::Error)),
        author: author(&event.sender()),
        ..Embed::default()
    }
}

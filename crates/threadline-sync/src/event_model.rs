//! Normalized view of incoming GitHub events.
//!
//! Webhook deliveries and Events API entries both decode into [`SyncEvent`];
//! everything downstream works on that plus the [`Entity`] snapshot it carries.

use std::fmt;

use serde_json::Value;
use threadline_github::{
    GithubComment, GithubEventPayload, GithubIssue, GithubLabel, GithubMilestone,
    GithubPullRequest, GithubReview, GithubReviewThread, GithubTeam, GithubUser, RepositoryEvent,
};

use crate::sync_error::SyncError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityKind {
    #[default]
    Issue,
    PullRequest,
}

impl EntityKind {
    /// Capitalized noun used at the start of embed titles.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Issue => "Issue",
            Self::PullRequest => "Pull request",
        }
    }

    pub fn lower_noun(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull request",
        }
    }
}

/// Identity of a tracked entity within the configured repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub number: u64,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind.lower_noun(), self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Issues,
    PullRequest,
    IssueComment,
    PullRequestReview,
    PullRequestReviewComment,
    PullRequestReviewThread,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::Issues,
        Self::PullRequest,
        Self::IssueComment,
        Self::PullRequestReview,
        Self::PullRequestReviewComment,
        Self::PullRequestReviewThread,
    ];

    /// Accepts webhook names (`issue_comment`) and Events API type names
    /// (`IssueCommentEvent`).
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|kind| {
            kind.as_str() == trimmed || kind.events_api_type() == trimmed
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::PullRequest => "pull_request",
            Self::IssueComment => "issue_comment",
            Self::PullRequestReview => "pull_request_review",
            Self::PullRequestReviewComment => "pull_request_review_comment",
            Self::PullRequestReviewThread => "pull_request_review_thread",
        }
    }

    pub fn events_api_type(self) -> &'static str {
        match self {
            Self::Issues => "IssuesEvent",
            Self::PullRequest => "PullRequestEvent",
            Self::IssueComment => "IssueCommentEvent",
            Self::PullRequestReview => "PullRequestReviewEvent",
            Self::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            Self::PullRequestReviewThread => "PullRequestReviewThreadEvent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventAction {
    Opened,
    Edited,
    Closed,
    Reopened,
    Labeled,
    Unlabeled,
    Assigned,
    Unassigned,
    Locked,
    Unlocked,
    Milestoned,
    Demilestoned,
    Transferred,
    Deleted,
    ReviewRequested,
    ReviewRequestRemoved,
    ReadyForReview,
    ConvertedToDraft,
    Created,
    Submitted,
    Dismissed,
    Updated,
    Resolved,
    Unresolved,
    Other(String),
}

impl EventAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "opened" => Self::Opened,
            "edited" => Self::Edited,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "labeled" => Self::Labeled,
            "unlabeled" => Self::Unlabeled,
            "assigned" => Self::Assigned,
            "unassigned" => Self::Unassigned,
            "locked" => Self::Locked,
            "unlocked" => Self::Unlocked,
            "milestoned" => Self::Milestoned,
            "demilestoned" => Self::Demilestoned,
            "transferred" => Self::Transferred,
            "deleted" => Self::Deleted,
            "review_requested" => Self::ReviewRequested,
            "review_request_removed" => Self::ReviewRequestRemoved,
            "ready_for_review" => Self::ReadyForReview,
            "converted_to_draft" => Self::ConvertedToDraft,
            "created" => Self::Created,
            "submitted" => Self::Submitted,
            "dismissed" => Self::Dismissed,
            "updated" => Self::Updated,
            "resolved" => Self::Resolved,
            "unresolved" => Self::Unresolved,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Edited => "edited",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Labeled => "labeled",
            Self::Unlabeled => "unlabeled",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Milestoned => "milestoned",
            Self::Demilestoned => "demilestoned",
            Self::Transferred => "transferred",
            Self::Deleted => "deleted",
            Self::ReviewRequested => "review_requested",
            Self::ReviewRequestRemoved => "review_request_removed",
            Self::ReadyForReview => "ready_for_review",
            Self::ConvertedToDraft => "converted_to_draft",
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Dismissed => "dismissed",
            Self::Updated => "updated",
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Undecoded event envelope: the event name plus its JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub event_name: String,
    pub payload: Value,
}

impl RawEvent {
    pub fn new(event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
        }
    }
}

/// Snapshot of an issue or pull request as carried by one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
    pub status: String,
    pub state_reason: Option<String>,
    pub merged: bool,
    pub author: GithubUser,
    pub labels: Vec<GithubLabel>,
    pub assignees: Vec<GithubUser>,
    pub requested_reviewers: Vec<GithubUser>,
    pub requested_teams: Vec<GithubTeam>,
    pub milestone: Option<GithubMilestone>,
    pub locked: bool,
}

impl Entity {
    pub fn from_issue(issue: &GithubIssue) -> Self {
        let kind = if issue.is_pull_request() {
            EntityKind::PullRequest
        } else {
            EntityKind::Issue
        };
        Self {
            kind,
            number: issue.number,
            title: issue.title.clone(),
            body: issue.body.clone().unwrap_or_default(),
            html_url: issue.html_url.clone(),
            status: issue.state.clone(),
            state_reason: issue.state_reason.clone(),
            merged: false,
            author: issue.user.clone(),
            labels: issue.labels.clone(),
            assignees: issue.assignees.clone(),
            requested_reviewers: Vec::new(),
            requested_teams: Vec::new(),
            milestone: issue.milestone.clone(),
            locked: issue.locked,
        }
    }

    pub fn from_pull_request(pull: &GithubPullRequest) -> Self {
        let status = if pull.merged {
            "merged".to_string()
        } else if pull.draft && pull.state == "open" {
            "draft".to_string()
        } else {
            pull.state.clone()
        };
        Self {
            kind: EntityKind::PullRequest,
            number: pull.number,
            title: pull.title.clone(),
            body: pull.body.clone().unwrap_or_default(),
            html_url: pull.html_url.clone(),
            status,
            state_reason: None,
            merged: pull.merged,
            author: pull.user.clone(),
            labels: pull.labels.clone(),
            assignees: pull.assignees.clone(),
            requested_reviewers: pull.requested_reviewers.clone(),
            requested_teams: pull.requested_teams.clone(),
            milestone: pull.milestone.clone(),
            locked: pull.locked,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind,
            number: self.number,
        }
    }
}

/// The payload object a reply message is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySubject<'a> {
    Comment(&'a GithubComment),
    Review(&'a GithubReview),
    ReviewComment(&'a GithubComment),
    ReviewThread(&'a GithubReviewThread),
}

impl ReplySubject<'_> {
    pub fn correlation_id(&self) -> Option<u64> {
        match self {
            Self::Comment(comment) | Self::ReviewComment(comment) => Some(comment.id),
            Self::Review(review) => Some(review.id),
            Self::ReviewThread(thread) => thread.correlation_id(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Comment(_) => "comment",
            Self::Review(_) => "review",
            Self::ReviewComment(_) => "review comment",
            Self::ReviewThread(_) => "review thread",
        }
    }
}

/// A decoded event ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub action: EventAction,
    pub payload: GithubEventPayload,
}

impl SyncEvent {
    pub fn decode(raw: &RawEvent) -> Result<Self, SyncError> {
        let kind = EventKind::parse(&raw.event_name).ok_or_else(|| {
            SyncError::malformed(None, format!("unsupported event kind '{}'", raw.event_name))
        })?;
        let payload: GithubEventPayload = serde_json::from_value(raw.payload.clone())
            .map_err(|error| {
                SyncError::malformed(None, format!("invalid {kind} payload: {error}"))
            })?;
        Self::from_payload(kind, payload)
    }

    /// Events API entries carry the actor outside the payload; it stands in for
    /// the webhook `sender`.
    pub fn from_repository_event(event: &RepositoryEvent) -> Result<Self, SyncError> {
        let mut decoded = Self::decode(&RawEvent::new(
            event.event_type.clone(),
            event.payload.clone(),
        ))?;
        if decoded.payload.sender.is_none() {
            decoded.payload.sender = event.actor.clone();
        }
        Ok(decoded)
    }

    pub fn from_payload(kind: EventKind, payload: GithubEventPayload) -> Result<Self, SyncError> {
        let action = payload
            .action
            .as_deref()
            .map(EventAction::parse)
            .ok_or_else(|| SyncError::malformed(None, format!("{kind} payload has no action")))?;
        let event = Self {
            kind,
            action,
            payload,
        };
        event.entity()?;
        Ok(event)
    }

    pub fn entity(&self) -> Result<Entity, SyncError> {
        match self.kind {
            EventKind::Issues | EventKind::IssueComment => self
                .payload
                .issue
                .as_ref()
                .map(Entity::from_issue)
                .ok_or_else(|| {
                    SyncError::malformed(None, format!("{} payload has no issue", self.kind))
                }),
            EventKind::PullRequest
            | EventKind::PullRequestReview
            | EventKind::PullRequestReviewComment
            | EventKind::PullRequestReviewThread => self
                .payload
                .pull_request
                .as_ref()
                .map(Entity::from_pull_request)
                .ok_or_else(|| {
                    SyncError::malformed(
                        None,
                        format!("{} payload has no pull_request", self.kind),
                    )
                }),
        }
    }

    pub fn sender(&self) -> GithubUser {
        self.payload.sender.clone().unwrap_or_default()
    }

    pub fn reply_subject(&self) -> Result<ReplySubject<'_>, SyncError> {
        let entity = self.entity()?.entity_ref();
        let missing = |field: &str| {
            SyncError::malformed(
                Some(entity),
                format!("{} {} payload has no {field}", self.kind, self.action),
            )
        };
        match self.kind {
            EventKind::IssueComment => self
                .payload
                .comment
                .as_ref()
                .map(ReplySubject::Comment)
                .ok_or_else(|| missing("comment")),
            EventKind::PullRequestReview => self
                .payload
                .review
                .as_ref()
                .map(ReplySubject::Review)
                .ok_or_else(|| missing("review")),
            EventKind::PullRequestReviewComment => self
                .payload
                .comment
                .as_ref()
                .map(ReplySubject::ReviewComment)
                .ok_or_else(|| missing("comment")),
            EventKind::PullRequestReviewThread => self
                .payload
                .thread
                .as_ref()
                .map(ReplySubject::ReviewThread)
                .ok_or_else(|| missing("thread")),
            EventKind::Issues | EventKind::PullRequest => Err(SyncError::malformed(
                Some(entity),
                format!("{} events have no reply subject", self.kind),
            )),
        }
    }
}

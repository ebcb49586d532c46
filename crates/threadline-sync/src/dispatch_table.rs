//! Routing from (event kind, action) to the operation that handles it.

use crate::event_model::{EventAction, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Create the entity's thread and post the opening message.
    OpenThread,
    /// Re-render the opening message in place.
    EditOpening,
    /// Append a status message; optionally re-render the opening message too.
    PostStatus { refresh_opening: bool },
    /// Append a comment/review message carrying its correlation id.
    PostReply,
    /// Re-render an earlier reply found by correlation id.
    EditReply,
    /// Append a message recording that a reply was removed.
    PostTombstone,
}

/// `None` means the action is not synced for that kind.
pub fn route(kind: EventKind, action: &EventAction) -> Option<HandlerKind> {
    use crate::event_model::EventAction as A;
    use self::HandlerKind as H;

    let refresh = H::PostStatus {
        refresh_opening: true,
    };
    let append_only = H::PostStatus {
        refresh_opening: false,
    };
    match (kind, action) {
        (EventKind::Issues | EventKind::PullRequest, A::Opened) => Some(H::OpenThread),
        (EventKind::Issues | EventKind::PullRequest, A::Edited) => Some(H::EditOpening),
        (
            EventKind::Issues | EventKind::PullRequest,
            A::Closed
            | A::Reopened
            | A::Labeled
            | A::Unlabeled
            | A::Assigned
            | A::Unassigned
            | A::Locked
            | A::Unlocked
            | A::Milestoned
            | A::Demilestoned,
        ) => Some(refresh),
        (EventKind::Issues | EventKind::PullRequest, A::Deleted | A::Transferred) => {
            Some(append_only)
        }
        (
            EventKind::PullRequest,
            A::ReviewRequested | A::ReviewRequestRemoved | A::ReadyForReview | A::ConvertedToDraft,
        ) => Some(refresh),

        (EventKind::IssueComment | EventKind::PullRequestReviewComment, A::Created) => {
            Some(H::PostReply)
        }
        (EventKind::IssueComment | EventKind::PullRequestReviewComment, A::Edited) => {
            Some(H::EditReply)
        }
        (EventKind::IssueComment | EventKind::PullRequestReviewComment, A::Deleted) => {
            Some(H::PostTombstone)
        }

        (EventKind::PullRequestReview, A::Submitted) => Some(H::PostReply),
        (EventKind::PullRequestReview, A::Edited) => Some(H::EditReply),
        (EventKind::PullRequestReview, A::Dismissed) => Some(H::PostTombstone),

        (EventKind::PullRequestReviewThread, A::Created) => Some(H::PostReply),
        (EventKind::PullRequestReviewThread, A::Updated) => Some(H::EditReply),
        (EventKind::PullRequestReviewThread, A::Resolved | A::Unresolved) => Some(append_only),

        _ => None,
    }
}

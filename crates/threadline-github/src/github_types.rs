//! Serde model for GitHub webhook payloads and Events API entries.
//!
//! Every field outside the identifying ones is defaulted: webhook payloads,
//! Events API payloads, and REST responses all carry different subsets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubMilestone {
    pub title: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubTeam {
    pub name: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubRepository {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
}

/// Reaction rollup attached to issues and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubReactions {
    #[serde(default, rename = "+1")]
    pub plus_one: u64,
    #[serde(default, rename = "-1")]
    pub minus_one: u64,
    #[serde(default)]
    pub laugh: u64,
    #[serde(default)]
    pub hooray: u64,
    #[serde(default)]
    pub confused: u64,
    #[serde(default)]
    pub heart: u64,
    #[serde(default)]
    pub rocket: u64,
    #[serde(default)]
    pub eyes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubIssue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub state_reason: Option<String>,
    #[serde(default)]
    pub user: GithubUser,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub assignees: Vec<GithubUser>,
    #[serde(default)]
    pub milestone: Option<GithubMilestone>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl GithubIssue {
    /// Issue-shaped payloads also describe pull requests (comment events).
    pub fn is_pull_request(&self) -> bool {
        self.pull_request
            .as_ref()
            .map(|links| !links.is_null())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub user: GithubUser,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub assignees: Vec<GithubUser>,
    #[serde(default)]
    pub requested_reviewers: Vec<GithubUser>,
    #[serde(default)]
    pub requested_teams: Vec<GithubTeam>,
    #[serde(default)]
    pub milestone: Option<GithubMilestone>,
    #[serde(default)]
    pub locked: bool,
}

/// Issue comment or pull request review comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub user: GithubUser,
    #[serde(default)]
    pub reactions: GithubReactions,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubReview {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: GithubUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubReviewThread {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub comments: Vec<GithubComment>,
}

impl GithubReviewThread {
    /// Numeric id the thread is correlated by. Webhook threads often carry
    /// only a node id; those have none, since a comment id would collide with
    /// that comment's own message footer.
    pub fn correlation_id(&self) -> Option<u64> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubChanges {
    #[serde(default)]
    pub new_repository: Option<GithubRepository>,
    #[serde(default)]
    pub new_issue: Option<GithubIssue>,
}

/// Union of every payload shape threadline consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubEventPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<GithubIssue>,
    #[serde(default)]
    pub pull_request: Option<GithubPullRequest>,
    #[serde(default)]
    pub comment: Option<GithubComment>,
    #[serde(default)]
    pub review: Option<GithubReview>,
    #[serde(default)]
    pub thread: Option<GithubReviewThread>,
    #[serde(default)]
    pub sender: Option<GithubUser>,
    #[serde(default)]
    pub label: Option<GithubLabel>,
    #[serde(default)]
    pub assignee: Option<GithubUser>,
    #[serde(default)]
    pub requested_reviewer: Option<GithubUser>,
    #[serde(default)]
    pub requested_team: Option<GithubTeam>,
    #[serde(default)]
    pub milestone: Option<GithubMilestone>,
    #[serde(default)]
    pub changes: Option<GithubChanges>,
    #[serde(default)]
    pub repository: Option<GithubRepository>,
}

/// One entry of `GET /repos/{owner}/{repo}/events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositoryEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub actor: Option<GithubUser>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

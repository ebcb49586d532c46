//! GitHub side of threadline: webhook/Events API payload model, repository
//! references, and the REST client used to fetch entities and past events.

pub mod github_api_client;
pub mod github_types;
pub mod repo_ref;

pub use github_api_client::GithubApiClient;
pub use github_types::{
    GithubChanges, GithubComment, GithubEventPayload, GithubIssue, GithubLabel, GithubMilestone,
    GithubPullRequest, GithubReactions, GithubRepository, GithubReview, GithubReviewThread,
    GithubTeam, GithubUser, RepositoryEvent,
};
pub use repo_ref::RepoRef;

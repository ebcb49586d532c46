use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use threadline_core::{request_json, Replay, RetryPolicy};

use crate::github_types::{GithubComment, GithubIssue, GithubPullRequest, RepositoryEvent};
use crate::repo_ref::RepoRef;

const EVENTS_PAGE_SIZE: usize = 100;
// The events endpoint serves at most 300 entries.
const EVENTS_MAX_PAGES: u32 = 3;

#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
    retry: RetryPolicy,
}

impl GithubApiClient {
    pub fn new(
        api_base: String,
        token: String,
        repo: RepoRef,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("threadline"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let token = token.trim();
        if !token.is_empty() {
            let auth_header = format!("Bearer {token}");
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&auth_header)
                    .context("invalid github authorization header")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
            retry: RetryPolicy::new(retry_max_attempts, retry_base_delay_ms),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub async fn get_issue(&self, number: u64) -> Result<GithubIssue> {
        self.get_json("get issue", || {
            self.http.get(format!(
                "{}/repos/{}/{}/issues/{}",
                self.api_base, self.repo.owner, self.repo.name, number
            ))
        })
        .await
    }

    pub async fn get_pull_request(&self, number: u64) -> Result<GithubPullRequest> {
        self.get_json("get pull request", || {
            self.http.get(format!(
                "{}/repos/{}/{}/pulls/{}",
                self.api_base, self.repo.owner, self.repo.name, number
            ))
        })
        .await
    }

    pub async fn get_issue_comment(&self, comment_id: u64) -> Result<GithubComment> {
        self.get_json("get issue comment", || {
            self.http.get(format!(
                "{}/repos/{}/{}/issues/comments/{}",
                self.api_base, self.repo.owner, self.repo.name, comment_id
            ))
        })
        .await
    }

    pub async fn list_repository_events(&self, page: u32) -> Result<Vec<RepositoryEvent>> {
        let page_value = page.max(1).to_string();
        let per_page = EVENTS_PAGE_SIZE.to_string();
        self.get_json("list repository events", || {
            self.http
                .get(format!(
                    "{}/repos/{}/{}/events",
                    self.api_base, self.repo.owner, self.repo.name
                ))
                .query(&[
                    ("per_page", per_page.as_str()),
                    ("page", page_value.as_str()),
                ])
        })
        .await
    }

    /// Scans the repository's recent event feed for one event id.
    pub async fn find_event_by_id(&self, event_id: &str) -> Result<Option<RepositoryEvent>> {
        let wanted = event_id.trim();
        for page in 1..=EVENTS_MAX_PAGES {
            let chunk = self.list_repository_events(page).await?;
            let chunk_len = chunk.len();
            if let Some(event) = chunk.into_iter().find(|event| event.id == wanted) {
                return Ok(Some(event));
            }
            if chunk_len < EVENTS_PAGE_SIZE {
                break;
            }
        }
        Ok(None)
    }

    /// Every GitHub call here is a read.
    async fn get_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        request_json("github api", operation, self.retry, Replay::Idempotent, request_builder)
            .await
    }
}

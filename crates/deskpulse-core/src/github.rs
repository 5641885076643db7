//! GitHub REST payloads: the public events feed and single-commit detail.

use crate::activity::{ActivityEvent, ActivityKind};
use crate::deserialize_null_default;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const API_BASE: &str = "https://api.github.com";
pub const EVENTS_PAGE_SIZE: u32 = 100;

pub fn events_url(base: &str, username: &str) -> String {
    format!(
        "{}/users/{username}/events?per_page={EVENTS_PAGE_SIZE}",
        base.trim_end_matches('/')
    )
}

pub fn commit_url(base: &str, repo: &str, sha: &str) -> String {
    format!("{}/repos/{repo}/commits/{sha}", base.trim_end_matches('/'))
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub repo: RepoRef,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub payload: EventBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventBody {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub size: u32,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub commits: Vec<CommitRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestRef {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub merged: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    #[serde(default)]
    pub message: String,
}

impl EventPayload {
    fn activity_kind(&self) -> ActivityKind {
        let closed = self.payload.action.as_deref() == Some("closed");
        match self.kind.as_str() {
            "PushEvent" => ActivityKind::Push,
            "PullRequestEvent" if closed => ActivityKind::PullRequestClosed,
            "IssuesEvent" if closed => ActivityKind::IssueClosed,
            _ => ActivityKind::Other,
        }
    }
}

impl From<EventPayload> for ActivityEvent {
    fn from(event: EventPayload) -> Self {
        let kind = event.activity_kind();
        let merged = event
            .payload
            .pull_request
            .as_ref()
            .map(|pr| pr.merged)
            .unwrap_or(false);
        ActivityEvent {
            kind,
            created_at: event.created_at,
            repo_name: event.repo.name,
            commit_messages: event
                .payload
                .commits
                .into_iter()
                .map(|commit| commit.message)
                .collect(),
            push_size: event.payload.size,
            merged,
            head_sha: event.payload.head.filter(|sha| !sha.is_empty()),
            git_ref: event.payload.git_ref.filter(|git_ref| !git_ref.is_empty()),
        }
    }
}

/// Decodes an events page, preserving the provider's newest-first order.
pub fn parse_events(body: &[u8]) -> Result<Vec<ActivityEvent>, serde_json::Error> {
    let events: Vec<EventPayload> = serde_json::from_slice(body)?;
    Ok(events.into_iter().map(ActivityEvent::from).collect())
}

#[derive(Debug, Clone, Deserialize)]
struct CommitDetail {
    commit: CommitBody,
}

#[derive(Debug, Clone, Deserialize)]
struct CommitBody {
    #[serde(default)]
    message: String,
}

/// Full message of a `GET /repos/{repo}/commits/{sha}` response.
pub fn parse_commit_message(body: &[u8]) -> Result<String, serde_json::Error> {
    let detail: CommitDetail = serde_json::from_slice(body)?;
    Ok(detail.commit.message)
}

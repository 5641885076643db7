//! Reduces a provider's raw activity stream into same-day counters and a short
//! "latest activity" feed.
//!
//! The two views are independent passes over the same input: the feed is built
//! from the newest push events regardless of their date, while the counters
//! only see events whose local calendar date is `today`.

use crate::{ellipsize, first_line};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const FEED_CAPACITY: usize = 4;
pub const FEED_MESSAGE_MAX_CHARS: usize = 30;

const BRANCH_REF_PREFIX: &str = "refs/heads/";
const GENERIC_PUSH_MESSAGE: &str = "Pushed update";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Push,
    PullRequestClosed,
    IssueClosed,
    Other,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequestClosed => "pull_request_closed",
            Self::IssueClosed => "issue_closed",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
    pub repo_name: String,
    /// Oldest first, as the provider lists them. May be empty.
    pub commit_messages: Vec<String>,
    pub push_size: u32,
    pub merged: bool,
    pub head_sha: Option<String>,
    pub git_ref: Option<String>,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, repo_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            created_at,
            repo_name: repo_name.into(),
            commit_messages: Vec::new(),
            push_size: 0,
            merged: false,
            head_sha: None,
            git_ref: None,
        }
    }

    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }

    pub fn branch_name(&self) -> Option<&str> {
        let git_ref = self.git_ref.as_deref()?.trim();
        let branch = git_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(git_ref);
        if branch.is_empty() {
            None
        } else {
            Some(branch)
        }
    }

    /// The provider's size figure wins; large pushes arrive with a truncated
    /// message list. A push always counts for at least one commit.
    fn commits_counted(&self) -> u32 {
        if self.push_size > 0 {
            return self.push_size;
        }
        match self.commit_messages.len() {
            0 => 1,
            len => u32::try_from(len).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub commit_count: u32,
    pub merged_pr_count: u32,
    pub closed_issue_count: u32,
    pub latest_feed: Vec<String>,
}

/// Resolves a commit's message when a push event arrives without one.
pub trait CommitLookup {
    fn commit_message(&self, repo: &str, sha: &str) -> Option<String>;
}

impl<F> CommitLookup for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn commit_message(&self, repo: &str, sha: &str) -> Option<String> {
        self(repo, sha)
    }
}

/// Commit messages fetched ahead of aggregation, keyed by repository and sha.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMessages {
    messages: HashMap<(String, String), String>,
}

impl CommitMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repo: impl Into<String>, sha: impl Into<String>, message: String) {
        self.messages.insert((repo.into(), sha.into()), message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl CommitLookup for CommitMessages {
    fn commit_message(&self, repo: &str, sha: &str) -> Option<String> {
        self.messages
            .get(&(repo.to_string(), sha.to_string()))
            .cloned()
    }
}

/// Aggregates against the machine's local time zone.
pub fn aggregate(
    events: &[ActivityEvent],
    today: NaiveDate,
    lookup: Option<&dyn CommitLookup>,
) -> ActivitySnapshot {
    aggregate_in(events, today, &Local, lookup)
}

pub fn aggregate_in<Tz: TimeZone>(
    events: &[ActivityEvent],
    today: NaiveDate,
    tz: &Tz,
    lookup: Option<&dyn CommitLookup>,
) -> ActivitySnapshot {
    let mut snapshot = ActivitySnapshot {
        latest_feed: latest_feed(events, lookup),
        ..ActivitySnapshot::default()
    };

    for event in events.iter().filter(|event| event.local_date(tz) == today) {
        match event.kind {
            ActivityKind::Push => {
                snapshot.commit_count = snapshot
                    .commit_count
                    .saturating_add(event.commits_counted());
            }
            ActivityKind::PullRequestClosed if event.merged => {
                snapshot.merged_pr_count = snapshot.merged_pr_count.saturating_add(1);
            }
            ActivityKind::IssueClosed => {
                snapshot.closed_issue_count = snapshot.closed_issue_count.saturating_add(1);
            }
            _ => {}
        }
    }

    snapshot
}

/// Feed lines for the newest push events, input assumed newest-first.
pub fn latest_feed(events: &[ActivityEvent], lookup: Option<&dyn CommitLookup>) -> Vec<String> {
    feed_slots(events)
        .into_iter()
        .map(|slot| match slot {
            FeedSlot::Commit { repo, message } => feed_line(repo, &summarize_commit(message)),
            FeedSlot::EmptyPush(event) => feed_line(&event.repo_name, &empty_push_message(event, lookup)),
        })
        .collect()
}

/// The `(repo, sha)` pairs [`latest_feed`] would ask a lookup for, so a caller
/// can fetch them before running the pure aggregation.
pub fn enrichment_requests(events: &[ActivityEvent]) -> Vec<(String, String)> {
    let mut requests: Vec<(String, String)> = Vec::new();
    for slot in feed_slots(events) {
        let FeedSlot::EmptyPush(event) = slot else {
            continue;
        };
        let Some(sha) = event.head_sha.as_deref().filter(|sha| !sha.is_empty()) else {
            continue;
        };
        let request = (event.repo_name.clone(), sha.to_string());
        if !requests.contains(&request) {
            requests.push(request);
        }
    }
    requests
}

/// First line of a commit message, shortened for the feed.
pub fn summarize_commit(message: &str) -> String {
    ellipsize(first_line(message).trim_end(), FEED_MESSAGE_MAX_CHARS)
}

enum FeedSlot<'a> {
    Commit { repo: &'a str, message: &'a str },
    EmptyPush(&'a ActivityEvent),
}

fn feed_slots(events: &[ActivityEvent]) -> Vec<FeedSlot<'_>> {
    let mut slots = Vec::with_capacity(FEED_CAPACITY);
    for event in events.iter().filter(|event| event.kind == ActivityKind::Push) {
        if slots.len() >= FEED_CAPACITY {
            break;
        }
        if event.commit_messages.is_empty() {
            slots.push(FeedSlot::EmptyPush(event));
            continue;
        }
        // Newest commit of the push first.
        for message in event.commit_messages.iter().rev() {
            if slots.len() >= FEED_CAPACITY {
                break;
            }
            slots.push(FeedSlot::Commit {
                repo: &event.repo_name,
                message,
            });
        }
    }
    slots
}

fn empty_push_message(event: &ActivityEvent, lookup: Option<&dyn CommitLookup>) -> String {
    let enriched = match (lookup, event.head_sha.as_deref()) {
        (Some(lookup), Some(sha)) if !sha.is_empty() => lookup
            .commit_message(&event.repo_name, sha)
            .filter(|message| !message.trim().is_empty()),
        _ => None,
    };
    if let Some(message) = enriched {
        return summarize_commit(&message);
    }
    match event.branch_name() {
        Some(branch) => format!("Pushed to {branch}"),
        None => GENERIC_PUSH_MESSAGE.to_string(),
    }
}

fn feed_line(repo: &str, message: &str) -> String {
    format!("{repo}: {message}")
}

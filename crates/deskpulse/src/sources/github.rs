use super::{read_body, transport_error};
use crate::config::GithubCredentials;
use chrono::Local;
use deskpulse_core::activity::{aggregate, enrichment_requests};
use deskpulse_core::github::{commit_url, events_url, parse_commit_message, parse_events, API_BASE};
use deskpulse_core::{ActivityEvent, ActivitySnapshot, CommitMessages, SourceError};
use futures_util::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const COMMIT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

pub struct GithubSource {
    client: Client,
    api_base: String,
    credentials: GithubCredentials,
}

impl GithubSource {
    pub fn new(client: Client, credentials: GithubCredentials) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
            credentials,
        }
    }

    pub async fn poll(&self) -> Result<ActivitySnapshot, SourceError> {
        let Some(username) = self.credentials.username.as_deref() else {
            return Err(SourceError::NotConfigured("No User"));
        };
        let body = self
            .get(&events_url(&self.api_base, username), None)
            .await?;
        let events = parse_events(&body).map_err(|err| SourceError::Decode(err.to_string()))?;
        let messages = self.lookup_empty_pushes(&events).await;
        Ok(aggregate(&events, Local::now().date_naive(), Some(&messages)))
    }

    /// Fetches head commit messages for pushes that arrived without any.
    /// Lookup failures only leave the entry absent.
    async fn lookup_empty_pushes(&self, events: &[ActivityEvent]) -> CommitMessages {
        let mut messages = CommitMessages::new();
        if self.credentials.token.is_none() {
            return messages;
        }
        let lookups = enrichment_requests(events)
            .into_iter()
            .map(|(repo, sha)| async move {
                let url = commit_url(&self.api_base, &repo, &sha);
                let message = match self.get(&url, Some(COMMIT_LOOKUP_TIMEOUT)).await {
                    Ok(body) => parse_commit_message(&body).ok(),
                    Err(err) => {
                        debug!(event = "commit_lookup_failed", repo = %repo, error = %err);
                        None
                    }
                };
                (repo, sha, message)
            });
        for (repo, sha, message) in join_all(lookups).await {
            if let Some(message) = message {
                messages.insert(repo, sha, message);
            }
        }
        messages
    }

    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<Vec<u8>, SourceError> {
        let mut request = self.client.get(url).header(ACCEPT, GITHUB_MEDIA_TYPE);
        if let Some(token) = &self.credentials.token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(transport_error)?;
        read_body(response).await
    }
}

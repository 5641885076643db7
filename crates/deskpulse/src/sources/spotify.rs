use super::{read_body, transport_error};
use crate::config::SpotifyCredentials;
use deskpulse_core::spotify::{parse_currently_playing, parse_token, CURRENTLY_PLAYING_URL, TOKEN_URL};
use deskpulse_core::{PlaybackSnapshot, SourceError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Refresh this long before the provider's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct SpotifySource {
    client: Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifySource {
    pub fn new(client: Client, credentials: SpotifyCredentials) -> Self {
        Self {
            client,
            credentials,
            token: Mutex::new(None),
        }
    }

    pub async fn poll(&self) -> Result<PlaybackSnapshot, SourceError> {
        let access_token = self.access_token().await?;
        let response = self
            .client
            .get(CURRENTLY_PLAYING_URL)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            StatusCode::NO_CONTENT => return Ok(PlaybackSnapshot::idle()),
            StatusCode::UNAUTHORIZED => {
                debug!(event = "spotify_token_rejected");
                *self.token.lock().await = None;
            }
            _ => {}
        }
        let body = read_body(response).await?;
        parse_currently_playing(&body).map_err(|err| SourceError::Decode(err.to_string()))
    }

    async fn access_token(&self) -> Result<String, SourceError> {
        let Some(refresh_token) = self.credentials.refresh_token.as_deref() else {
            return Err(SourceError::NotConfigured("No Token"));
        };
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(Instant::now())) {
            return Ok(token.access_token.clone());
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::Auth(status.as_u16()));
        }
        let body = response.bytes().await.map_err(transport_error)?;
        let token = parse_token(&body).map_err(|err| SourceError::Decode(err.to_string()))?;

        *cached = token.expires_in.map(|secs| CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now()
                + Duration::from_secs(secs).saturating_sub(TOKEN_EXPIRY_MARGIN),
        });
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_refresh_token_is_not_configured() {
        let source = SpotifySource::new(Client::new(), SpotifyCredentials::default());
        let err = source.poll().await.expect_err("no token");
        assert_eq!(err.status(), "No Token");
    }

    #[tokio::test(start_paused = true)]
    async fn cached_token_goes_stale_at_expiry() {
        let now = Instant::now();
        let token = CachedToken {
            access_token: "tok".to_string(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(token.is_fresh(now));
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!token.is_fresh(Instant::now()));
    }

    #[tokio::test]
    async fn fresh_cached_token_skips_the_grant() {
        let source = SpotifySource::new(
            Client::new(),
            SpotifyCredentials {
                refresh_token: Some("refresh".to_string()),
                ..SpotifyCredentials::default()
            },
        );
        *source.token.lock().await = Some(CachedToken {
            access_token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(600),
        });
        assert_eq!(source.access_token().await.expect("token"), "cached");
    }
}

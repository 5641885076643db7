//! Live adapters behind the runtime's [`Fetcher`] seam.

mod artwork;
mod github;
mod spotify;
mod system;

pub use artwork::ArtworkSource;
pub use github::GithubSource;
pub use spotify::SpotifySource;
pub use system::SystemProbe;

use crate::config::Config;
use crate::runtime::Fetcher;
use anyhow::{Context, Result};
use deskpulse_core::{
    ActivitySnapshot, PlaybackSnapshot, RenderedArt, SourceError, SystemSnapshot,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("deskpulse/", env!("CARGO_PKG_VERSION"));

pub struct Sources {
    system: SystemProbe,
    github: GithubSource,
    spotify: SpotifySource,
    artwork: ArtworkSource,
}

impl Sources {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            system: SystemProbe::new(),
            github: GithubSource::new(client.clone(), config.github.clone()),
            spotify: SpotifySource::new(client.clone(), config.spotify.clone()),
            artwork: ArtworkSource::new(client, config.art_width),
        })
    }
}

impl Fetcher for Sources {
    fn poll_system(&self) -> BoxFuture<'_, Result<SystemSnapshot, SourceError>> {
        self.system.sample().boxed()
    }

    fn poll_activity(&self) -> BoxFuture<'_, Result<ActivitySnapshot, SourceError>> {
        self.github.poll().boxed()
    }

    fn poll_playback(&self) -> BoxFuture<'_, Result<PlaybackSnapshot, SourceError>> {
        self.spotify.poll().boxed()
    }

    fn render_art<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedArt, SourceError>> {
        self.artwork.render(url).boxed()
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}

/// Body of a 200 response; any other status becomes `SourceError::Status`.
async fn read_body(response: Response) -> Result<Vec<u8>, SourceError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(SourceError::Status(status.as_u16()));
    }
    let bytes = response.bytes().await.map_err(transport_error)?;
    Ok(bytes.to_vec())
}

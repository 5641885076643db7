//! Spotify Web API payloads: refresh-token grant and currently-playing.

use crate::deserialize_null_default;
use crate::snapshot::PlaybackSnapshot;
use serde::Deserialize;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

/// Album images come largest first; index 1 is the 300px rendition.
const PREFERRED_IMAGE_INDEX: usize = 1;
const UNKNOWN_ARTIST: &str = "Unknown";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

pub fn parse_token(body: &[u8]) -> Result<TokenResponse, serde_json::Error> {
    serde_json::from_slice(body)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    progress_ms: u64,
    #[serde(default)]
    item: Option<TrackItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrackItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    album: Album,
}

#[derive(Debug, Clone, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<AlbumImage>,
}

#[derive(Debug, Clone, Deserialize)]
struct AlbumImage {
    url: String,
}

/// Paused playback and ad breaks (no `item`) read as idle.
pub fn parse_currently_playing(body: &[u8]) -> Result<PlaybackSnapshot, serde_json::Error> {
    let playing: CurrentlyPlaying = serde_json::from_slice(body)?;
    if !playing.is_playing {
        return Ok(PlaybackSnapshot::idle());
    }
    let Some(item) = playing.item else {
        return Ok(PlaybackSnapshot::idle());
    };

    let artist = item
        .artists
        .first()
        .map(|artist| artist.name.clone())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let images = &item.album.images;
    let artwork_url = images
        .get(PREFERRED_IMAGE_INDEX)
        .or_else(|| images.last())
        .map(|image| image.url.clone())
        .unwrap_or_default();

    Ok(PlaybackSnapshot {
        is_playing: true,
        track: item.name,
        artist,
        progress_percent: PlaybackSnapshot::progress_from_ms(playing.progress_ms, item.duration_ms),
        artwork_url,
    })
}

use super::{read_body, transport_error};
use deskpulse_core::raster::render_bytes;
use deskpulse_core::{RasterError, RenderedArt, SourceError};
use reqwest::Client;

pub struct ArtworkSource {
    client: Client,
    width: u32,
}

impl ArtworkSource {
    pub fn new(client: Client, width: u32) -> Self {
        Self { client, width }
    }

    /// Downloads the image, then resamples it off the async workers.
    pub async fn render(&self, url: &str) -> Result<RenderedArt, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let bytes = read_body(response).await?;
        let width = self.width;
        tokio::task::spawn_blocking(move || render_bytes(&bytes, width))
            .await
            .map_err(|err| SourceError::Transport(format!("render task failed: {err}")))?
            .map_err(raster_error)
    }
}

fn raster_error(err: RasterError) -> SourceError {
    SourceError::Decode(err.to_string())
}

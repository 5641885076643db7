pub mod activity;
pub mod github;
pub mod raster;
pub mod snapshot;
pub mod spotify;
pub mod state;

pub use activity::{
    aggregate, aggregate_in, ActivityEvent, ActivityKind, ActivitySnapshot, CommitLookup,
    CommitMessages,
};
pub use raster::{render, render_bytes, HalfBlock, RasterError, RenderedArt};
pub use snapshot::{FailureClass, PlaybackSnapshot, SourceError, SystemSnapshot};
pub use state::{Cadence, Dashboard, Effect, Flow, KeyPress, Message, Panel, SourceKind, ViewState};

use serde::{Deserialize, Deserializer};

/// Shortens `input` to at most `max` characters, marking the cut with `...`.
pub fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= 3 {
        return "...".chars().take(max).collect();
    }
    let prefix: String = input.chars().take(max - 3).collect();
    format!("{prefix}...")
}

/// First line of a possibly multi-line message, without trailing `\r`.
pub fn first_line(input: &str) -> &str {
    let line = input.split('\n').next().unwrap_or_default();
    line.strip_suffix('\r').unwrap_or(line)
}

/// Providers send `null` for fields they consider empty; treat it as the default.
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Clamps a sensor or progress reading into `0..=100`; NaN reads as zero.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    /// `None` when no GPU sensor answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_percent: Option<f64>,
}

impl SystemSnapshot {
    pub fn new(cpu_percent: f64, mem_percent: f64, gpu_percent: Option<f64>) -> Self {
        Self {
            cpu_percent: clamp_percent(cpu_percent),
            mem_percent: clamp_percent(mem_percent),
            gpu_percent: gpu_percent.map(clamp_percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track: String,
    pub artist: String,
    pub progress_percent: f64,
    /// Empty when nothing is playing or the album has no images.
    pub artwork_url: String,
}

impl PlaybackSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn progress_from_ms(progress_ms: u64, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 0.0;
        }
        clamp_percent(progress_ms as f64 / duration_ms as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Configuration,
    Transport,
    Protocol,
}

impl FailureClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
        }
    }
}

/// Why a source adapter produced no snapshot. Never fatal to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source not configured: {0}")]
    NotConfigured(&'static str),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("authorization rejected with status {0}")]
    Auth(u16),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("payload decode failed: {0}")]
    Decode(String),
}

impl SourceError {
    /// Short string shown next to the affected panel.
    pub fn status(&self) -> String {
        match self {
            Self::NotConfigured(label) => (*label).to_string(),
            Self::Transport(_) => "Net Err".to_string(),
            Self::TimedOut(_) => "Timeout".to_string(),
            Self::Auth(_) => "Auth Err".to_string(),
            Self::Status(code) => format!("Err {code}"),
            Self::Decode(_) => "Json Err".to_string(),
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            Self::NotConfigured(_) => FailureClass::Configuration,
            Self::Transport(_) | Self::TimedOut(_) => FailureClass::Transport,
            Self::Auth(_) | Self::Status(_) | Self::Decode(_) => FailureClass::Protocol,
        }
    }
}

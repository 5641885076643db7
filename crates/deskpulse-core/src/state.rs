//! The dashboard's single-writer state machine.
//!
//! [`Dashboard::update`] consumes one [`Message`] at a time and answers with
//! the [`Effect`]s the runtime should schedule. It performs no I/O itself:
//! every effect becomes a task that later delivers exactly one message back.
//! A source's next poll is only issued when its previous result is handled,
//! so each source has at most one fetch in flight.

use crate::activity::ActivitySnapshot;
use crate::raster::RenderedArt;
use crate::snapshot::{PlaybackSnapshot, SourceError, SystemSnapshot};
use chrono::{DateTime, Local};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    System,
    Activity,
    Playback,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::System, Self::Activity, Self::Playback];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Activity => "activity",
            Self::Playback => "playback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub tick: Duration,
    pub system: Duration,
    pub activity: Duration,
    pub playback: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            system: Duration::from_secs(2),
            activity: Duration::from_secs(60),
            playback: Duration::from_secs(5),
        }
    }
}

impl Cadence {
    pub fn poll_interval(&self, source: SourceKind) -> Duration {
        match source {
            SourceKind::System => self.system,
            SourceKind::Activity => self.activity,
            SourceKind::Playback => self.playback,
        }
    }
}

/// Last good value of one source plus the status of its latest failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel<T> {
    value: Option<T>,
    status: Option<String>,
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self {
            value: None,
            status: None,
        }
    }
}

impl<T> Panel<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_populated(&self) -> bool {
        self.value.is_some()
    }

    pub fn succeed(&mut self, value: T) {
        self.value = Some(value);
        self.status = None;
    }

    /// Keeps the previous value.
    pub fn fail(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.status = None;
    }

    fn apply(&mut self, result: Result<T, SourceError>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(err) => self.fail(err.status()),
        }
    }
}

impl<T: Clone + Default> Panel<T> {
    pub fn value_or_default(&self) -> T {
        self.value.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub clock: DateTime<Local>,
    pub system: Panel<SystemSnapshot>,
    pub activity: Panel<ActivitySnapshot>,
    pub playback: Panel<PlaybackSnapshot>,
    pub art: Panel<RenderedArt>,
    /// Artwork URL most recently sent for rendering; the one-entry cache key.
    art_url: Option<String>,
}

impl ViewState {
    pub fn new(clock: DateTime<Local>) -> Self {
        Self {
            clock,
            system: Panel::default(),
            activity: Panel::default(),
            playback: Panel::default(),
            art: Panel::default(),
            art_url: None,
        }
    }

    pub fn art_url(&self) -> Option<&str> {
        self.art_url.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    Ctrl(char),
    Other,
}

impl KeyPress {
    pub fn is_quit(self) -> bool {
        matches!(self, Self::Char('q') | Self::Ctrl('c'))
    }
}

#[derive(Debug)]
pub enum Message {
    Tick(DateTime<Local>),
    System(Result<SystemSnapshot, SourceError>),
    Activity(Result<ActivitySnapshot, SourceError>),
    Playback(Result<PlaybackSnapshot, SourceError>),
    ArtRendered {
        url: String,
        art: Result<RenderedArt, SourceError>,
    },
    Key(KeyPress),
    Quit,
}

impl Message {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tick(_) => "tick",
            Self::System(_) => "system",
            Self::Activity(_) => "activity",
            Self::Playback(_) => "playback",
            Self::ArtRendered { .. } => "art_rendered",
            Self::Key(_) => "key",
            Self::Quit => "quit",
        }
    }

    /// The failure carried by a source or render result, if any.
    pub fn failure(&self) -> Option<&SourceError> {
        match self {
            Self::System(Err(err))
            | Self::Activity(Err(err))
            | Self::Playback(Err(err))
            | Self::ArtRendered { art: Err(err), .. } => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Tick { after: Duration },
    Poll { source: SourceKind, after: Duration },
    RenderArt { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(Vec<Effect>),
    Quit,
}

pub struct Dashboard {
    state: ViewState,
    cadence: Cadence,
}

impl Dashboard {
    pub fn new(now: DateTime<Local>, cadence: Cadence) -> Self {
        Self {
            state: ViewState::new(now),
            cadence,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.state
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// First clock tick plus an immediate poll of every source.
    pub fn start(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::Tick {
            after: self.cadence.tick,
        }];
        effects.extend(SourceKind::ALL.into_iter().map(|source| Effect::Poll {
            source,
            after: Duration::ZERO,
        }));
        effects
    }

    pub fn update(&mut self, message: Message) -> Flow {
        match message {
            Message::Tick(now) => {
                self.state.clock = now;
                Flow::Continue(vec![Effect::Tick {
                    after: self.cadence.tick,
                }])
            }
            Message::System(result) => {
                self.state.system.apply(result);
                Flow::Continue(vec![self.next_poll(SourceKind::System)])
            }
            Message::Activity(result) => {
                self.state.activity.apply(result);
                Flow::Continue(vec![self.next_poll(SourceKind::Activity)])
            }
            Message::Playback(result) => {
                let mut effects = Vec::with_capacity(2);
                if let Ok(snapshot) = &result {
                    effects.extend(self.observe_artwork(&snapshot.artwork_url));
                }
                self.state.playback.apply(result);
                effects.push(self.next_poll(SourceKind::Playback));
                Flow::Continue(effects)
            }
            Message::ArtRendered { url, art } => {
                self.apply_art(&url, art);
                Flow::Continue(Vec::new())
            }
            Message::Key(key) if key.is_quit() => Flow::Quit,
            Message::Key(_) => Flow::Continue(Vec::new()),
            Message::Quit => Flow::Quit,
        }
    }

    fn next_poll(&self, source: SourceKind) -> Effect {
        Effect::Poll {
            source,
            after: self.cadence.poll_interval(source),
        }
    }

    /// The displayed art stays until the new render arrives.
    fn observe_artwork(&mut self, url: &str) -> Option<Effect> {
        if self.state.art_url.as_deref().unwrap_or_default() == url {
            return None;
        }
        if url.is_empty() {
            self.state.art_url = None;
            self.state.art.clear();
            return None;
        }
        self.state.art_url = Some(url.to_string());
        Some(Effect::RenderArt {
            url: url.to_string(),
        })
    }

    fn apply_art(&mut self, url: &str, art: Result<RenderedArt, SourceError>) {
        if self.state.art_url.as_deref() != Some(url) {
            return;
        }
        match art {
            Ok(art) => self.state.art.succeed(art),
            Err(err) => {
                self.state.art.clear();
                self.state.art.fail(err.status());
            }
        }
    }
}

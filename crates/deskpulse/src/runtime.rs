//! Turns dashboard effects into spawned tasks that each deliver one message.

use chrono::Local;
use deskpulse_core::{
    ActivitySnapshot, Effect, Message, PlaybackSnapshot, RenderedArt, SourceError, SourceKind,
    SystemSnapshot,
};
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

pub const MESSAGE_QUEUE_CAPACITY: usize = 64;

/// Seam between the runtime and the outside world.
pub trait Fetcher: Send + Sync + 'static {
    fn poll_system(&self) -> BoxFuture<'_, Result<SystemSnapshot, SourceError>>;
    fn poll_activity(&self) -> BoxFuture<'_, Result<ActivitySnapshot, SourceError>>;
    fn poll_playback(&self) -> BoxFuture<'_, Result<PlaybackSnapshot, SourceError>>;
    fn render_art<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedArt, SourceError>>;
}

pub struct Runtime<F> {
    fetcher: Arc<F>,
    tx: mpsc::Sender<Message>,
    deadline: Duration,
}

impl<F: Fetcher> Runtime<F> {
    pub fn new(fetcher: Arc<F>, tx: mpsc::Sender<Message>, deadline: Duration) -> Self {
        Self {
            fetcher,
            tx,
            deadline,
        }
    }

    pub fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.spawn(effect);
        }
    }

    fn spawn(&self, effect: Effect) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let deadline = self.deadline;
        tokio::spawn(async move {
            let message = run_effect(fetcher.as_ref(), effect, deadline).await;
            let label = message.label();
            if tx.send(message).await.is_err() {
                debug!(event = "message_dropped", message = label);
            }
        });
    }
}

/// Waits out the effect's delay, then performs it under `deadline`.
pub async fn run_effect<F>(fetcher: &F, effect: Effect, deadline: Duration) -> Message
where
    F: Fetcher + ?Sized,
{
    match effect {
        Effect::Tick { after } => {
            tokio::time::sleep(after).await;
            Message::Tick(Local::now())
        }
        Effect::Poll { source, after } => {
            tokio::time::sleep(after).await;
            match source {
                SourceKind::System => {
                    Message::System(with_deadline(deadline, fetcher.poll_system()).await)
                }
                SourceKind::Activity => {
                    Message::Activity(with_deadline(deadline, fetcher.poll_activity()).await)
                }
                SourceKind::Playback => {
                    Message::Playback(with_deadline(deadline, fetcher.poll_playback()).await)
                }
            }
        }
        Effect::RenderArt { url } => {
            debug!(event = "art_render_requested", url = %url);
            let art = with_deadline(deadline, fetcher.render_art(&url)).await;
            Message::ArtRendered { url, art }
        }
    }
}

async fn with_deadline<T>(
    deadline: Duration,
    fetch: impl Future<Output = Result<T, SourceError>>,
) -> Result<T, SourceError> {
    match tokio::time::timeout(deadline, fetch).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::TimedOut(deadline)),
    }
}

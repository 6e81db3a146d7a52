use std::fmt;

use tokio::sync::mpsc;
use url::Url;

use crate::{session::SessionEvent, time::MediaTime};

mod handle;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use handle::PlayerHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    Live,
    Vod,
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerSlot::Live => write!(f, "Live"),
            PlayerSlot::Vod => write!(f, "VOD"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    Idle,
    Ready,
    Buffering,
    Playing,
    Ended,
}

impl PlayerState {
    /// Playing or about to play once enough data arrives.
    pub fn is_active(&self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }
}

/// Timed metadata emitted inline by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    TextMetadata { description: String, text: String },
    Text { text: String },
    Unknown { kind: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    StateChanged(PlayerState),
    DurationChanged(MediaTime),
    Error(String),
    Cue(Cue),
    /// A seek finished. Carries the target that was passed to [`PlayerEngine::seek`].
    SeekCompleted(MediaTime),
    WillRebuffer,
}

/// A media player backend.
///
/// Engines report asynchronous changes through the [`EngineEvents`] they were
/// created with; the session delivers those to the coordinator in emission order.
pub trait PlayerEngine {
    fn version(&self) -> String;

    fn load(&mut self, url: &Url);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: MediaTime);

    fn state(&self) -> PlayerState;

    fn duration(&self) -> MediaTime;

    fn position(&self) -> MediaTime;

    /// End of the buffered range.
    fn buffered(&self) -> MediaTime;
}

pub trait EngineFactory {
    type Engine: PlayerEngine;

    /// Builds the engine for `slot`. It reports back through `events`.
    fn create(&self, slot: PlayerSlot, events: EngineEvents) -> Self::Engine;
}

/// Consumer of engine notifications, one method per event kind.
pub trait PlayerDelegate {
    fn did_change_state(&mut self, slot: PlayerSlot, state: PlayerState);

    fn did_change_duration(&mut self, slot: PlayerSlot, duration: MediaTime);

    fn did_fail(&mut self, slot: PlayerSlot, message: String);

    fn did_output_cue(&mut self, slot: PlayerSlot, cue: Cue) {
        match cue {
            Cue::TextMetadata { description, text } => {
                tracing::info!(%slot, "Received Timed Metadata ({description}): {text}")
            }
            Cue::Text { text } => tracing::info!(%slot, "Received Text Cue: \"{text}\""),
            Cue::Unknown { kind } => tracing::info!(%slot, "Received unknown cue (type {kind})"),
        }
    }

    fn did_complete_seek(&mut self, slot: PlayerSlot, position: MediaTime);

    fn will_rebuffer(&mut self, slot: PlayerSlot) {
        tracing::debug!(%slot, "Player will rebuffer and resume playback");
    }
}

/// Routes an engine event to the matching delegate method.
pub fn dispatch<D>(delegate: &mut D, slot: PlayerSlot, event: EngineEvent)
where
    D: PlayerDelegate + ?Sized,
{
    match event {
        EngineEvent::StateChanged(state) => delegate.did_change_state(slot, state),
        EngineEvent::DurationChanged(duration) => delegate.did_change_duration(slot, duration),
        EngineEvent::Error(message) => delegate.did_fail(slot, message),
        EngineEvent::Cue(cue) => delegate.did_output_cue(slot, cue),
        EngineEvent::SeekCompleted(position) => delegate.did_complete_seek(slot, position),
        EngineEvent::WillRebuffer => delegate.will_rebuffer(slot),
    }
}

/// Identifies one engine instance. The live slot gets a new generation every
/// time its engine is recreated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineId {
    pub slot: PlayerSlot,
    pub generation: u64,
}

/// Channel an engine uses to notify the session.
#[derive(Clone, Debug)]
pub struct EngineEvents {
    id: EngineId,
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl EngineEvents {
    pub(crate) fn new(id: EngineId, sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Returns false once the session is gone.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.sender
            .send(SessionEvent::Engine { id: self.id, event })
            .is_ok()
    }
}

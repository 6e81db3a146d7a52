use tokio::sync::mpsc;
use url::Url;

use super::{EngineEvents, EngineFactory, EngineId, PlayerEngine, PlayerSlot, PlayerState};
use crate::{session::SessionEvent, time::MediaTime};

/// Slot holding at most one engine instance.
///
/// The engine is created on the first load and reused by later loads until it
/// is discarded.
pub struct PlayerHandle<E> {
    slot: PlayerSlot,
    generation: u64,
    engine: Option<E>,
    last_error: Option<String>,
}

impl<E> PlayerHandle<E>
where
    E: PlayerEngine,
{
    pub fn new(slot: PlayerSlot) -> Self {
        Self {
            slot,
            generation: 0,
            engine: None,
            last_error: None,
        }
    }

    pub fn slot(&self) -> PlayerSlot {
        self.slot
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Whether an event tagged with `id` comes from the engine currently held.
    pub fn accepts(&self, id: EngineId) -> bool {
        self.engine.is_some() && id.slot == self.slot && id.generation == self.generation
    }

    pub fn load<F>(
        &mut self,
        factory: &F,
        sender: &mpsc::UnboundedSender<SessionEvent>,
        url: &Url,
    ) where
        F: EngineFactory<Engine = E>,
    {
        if self.engine.is_none() {
            self.generation += 1;
            let id = EngineId {
                slot: self.slot,
                generation: self.generation,
            };
            let engine = factory.create(self.slot, EngineEvents::new(id, sender.clone()));
            tracing::info!(
                "{} player initialized: version {}",
                self.slot,
                engine.version()
            );
            self.engine = Some(engine);
        }
        self.last_error = None;
        if let Some(engine) = self.engine.as_mut() {
            engine.load(url);
        }
    }

    /// Drops the engine so the next load starts from a fresh instance.
    pub fn discard(&mut self) -> Option<E> {
        self.last_error = None;
        self.engine.take()
    }

    pub fn play(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
        }
    }

    /// Returns false when there is no engine to seek.
    pub fn seek(&mut self, position: MediaTime) -> bool {
        match self.engine.as_mut() {
            Some(engine) => {
                engine.seek(position);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.engine.as_ref().map(PlayerEngine::state)
    }

    pub fn duration(&self) -> Option<MediaTime> {
        self.engine.as_ref().map(PlayerEngine::duration)
    }

    pub fn position(&self) -> Option<MediaTime> {
        self.engine.as_ref().map(PlayerEngine::position)
    }

    pub fn buffered(&self) -> Option<MediaTime> {
        self.engine.as_ref().map(PlayerEngine::buffered)
    }
}

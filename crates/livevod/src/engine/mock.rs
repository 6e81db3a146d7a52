//! In-memory engine used by tests. Every instance shares its state with a
//! [`MockHandle`] so calls can be inspected after the engine was handed over.

use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use super::{EngineEvent, EngineEvents, EngineFactory, EngineId, PlayerEngine, PlayerSlot, PlayerState};
use crate::time::MediaTime;

#[derive(Clone, Debug, PartialEq)]
pub enum MockCall {
    Load(Url),
    Play,
    Pause,
    Seek(MediaTime),
}

#[derive(Debug)]
struct MockState {
    calls: Vec<MockCall>,
    state: PlayerState,
    duration: MediaTime,
    position: MediaTime,
    buffered: MediaTime,
}

#[derive(Clone, Debug)]
pub struct MockHandle {
    shared: Arc<Mutex<MockState>>,
    events: EngineEvents,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.shared.lock().unwrap()
    }

    pub fn id(&self) -> EngineId {
        self.events.id()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn last_seek(&self) -> Option<MediaTime> {
        self.lock().calls.iter().rev().find_map(|call| match call {
            MockCall::Seek(position) => Some(*position),
            _ => None,
        })
    }

    pub fn duration(&self) -> MediaTime {
        self.lock().duration
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn set_state(&self, state: PlayerState) {
        self.lock().state = state;
    }

    pub fn set_duration(&self, duration: MediaTime) {
        self.lock().duration = duration;
    }

    pub fn set_position(&self, position: MediaTime) {
        self.lock().position = position;
    }

    pub fn set_buffered(&self, buffered: MediaTime) {
        self.lock().buffered = buffered;
    }

    /// Sends an event as the engine would from its own thread.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.events.emit(event)
    }
}

pub struct MockEngine {
    handle: MockHandle,
}

impl PlayerEngine for MockEngine {
    fn version(&self) -> String {
        "mock".to_string()
    }

    fn load(&mut self, url: &Url) {
        self.handle.lock().calls.push(MockCall::Load(url.clone()));
    }

    fn play(&mut self) {
        let mut state = self.handle.lock();
        state.calls.push(MockCall::Play);
        state.state = PlayerState::Playing;
    }

    fn pause(&mut self) {
        let mut state = self.handle.lock();
        state.calls.push(MockCall::Pause);
        state.state = PlayerState::Ready;
    }

    fn seek(&mut self, position: MediaTime) {
        self.handle.lock().calls.push(MockCall::Seek(position));
    }

    fn state(&self) -> PlayerState {
        self.handle.lock().state
    }

    fn duration(&self) -> MediaTime {
        self.handle.lock().duration
    }

    fn position(&self) -> MediaTime {
        self.handle.lock().position
    }

    fn buffered(&self) -> MediaTime {
        self.handle.lock().buffered
    }
}

/// Creates [`MockEngine`]s and keeps a handle to each of them.
#[derive(Clone, Default)]
pub struct MockEngineFactory {
    created: Arc<Mutex<Vec<MockHandle>>>,
    vod_duration: Option<MediaTime>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration new VOD engines report right away.
    pub fn with_vod_duration(mut self, duration: MediaTime) -> Self {
        self.vod_duration = Some(duration);
        self
    }

    pub fn handles(&self, slot: PlayerSlot) -> Vec<MockHandle> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|handle| handle.id().slot == slot)
            .cloned()
            .collect()
    }

    pub fn latest(&self, slot: PlayerSlot) -> Option<MockHandle> {
        self.handles(slot).pop()
    }
}

impl EngineFactory for MockEngineFactory {
    type Engine = MockEngine;

    fn create(&self, slot: PlayerSlot, events: EngineEvents) -> Self::Engine {
        let duration = match slot {
            PlayerSlot::Live => MediaTime::INDEFINITE,
            PlayerSlot::Vod => self.vod_duration.unwrap_or(MediaTime::INVALID),
        };
        let handle = MockHandle {
            shared: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                state: PlayerState::Idle,
                duration,
                position: MediaTime::ZERO,
                buffered: MediaTime::ZERO,
            })),
            events,
        };
        self.created.lock().unwrap().push(handle.clone());
        MockEngine { handle }
    }
}

use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Duration, MissedTickBehavior},
};

use crate::{
    config::SessionConfig,
    controls::ControlsRequest,
    coordinator::{Coordinator, Effect, FetchPurpose},
    display::SliderGeometry,
    engine::{EngineEvent, EngineFactory, EngineId},
    error::LivevodResult,
    metadata::{MetadataProvider, StreamMetadata},
    seek::TouchPhase,
    view::ViewState,
};

/// Asynchronous completions marshaled back onto the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    Engine {
        id: EngineId,
        event: EngineEvent,
    },
    MetadataFetched {
        purpose: FetchPurpose,
        result: LivevodResult<StreamMetadata>,
    },
    HideControls {
        token: u64,
    },
}

/// Input from the view layer.
#[derive(Clone, Debug, PartialEq)]
pub enum UserCommand {
    ViewWillAppear,
    ViewDidDisappear,
    DidEnterBackground,
    DidBecomeActive,

    Play,
    Pause,
    SeekSlider {
        value: f32,
        phase: Option<TouchPhase>,
    },
    Back,
    Forward,
    BackToLive,
    TapToSeek {
        x: f64,
        width: f64,
    },
    ToggleControls,
    DismissError,
    SliderLayout {
        geometry: SliderGeometry,
        label_width: f64,
    },
}

/// Runs a [`Coordinator`] on a single task.
///
/// ```text
///  user commands ─────┐
///  engine events ─────┤
///  metadata results ──┼──► select! ──► Coordinator ──► watch<ViewState>
///  hide timer ────────┤                   │
///  5 Hz tick ─────────┘                   └──► effects (fetch / timers)
/// ```
pub struct PlayerSession<F, P>
where
    F: EngineFactory,
    P: MetadataProvider,
{
    coordinator: Coordinator<F>,
    provider: Arc<P>,
    sender: mpsc::UnboundedSender<SessionEvent>,
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
    hide_task: Option<(u64, JoinHandle<()>)>,
    tick_interval: Duration,
    view: watch::Sender<ViewState>,
}

impl<F, P> PlayerSession<F, P>
where
    F: EngineFactory,
    P: MetadataProvider,
{
    pub fn new(config: SessionConfig, factory: F, provider: P) -> (Self, watch::Receiver<ViewState>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tick_interval = config.tick_interval();
        let coordinator = Coordinator::new(config, factory, sender.clone());
        let (view, view_receiver) = watch::channel(coordinator.view().clone());

        let session = Self {
            coordinator,
            provider: Arc::new(provider),
            sender,
            receiver,
            hide_task: None,
            tick_interval,
            view,
        };
        (session, view_receiver)
    }

    pub fn coordinator(&self) -> &Coordinator<F> {
        &self.coordinator
    }

    /// Drives the screen until `commands` is closed, then releases the players.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<UserCommand>) {
        self.coordinator.view_did_load();
        self.flush();

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let ticking = self.coordinator.display_link_active();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.receiver.recv() => self.handle_event(event),
                _ = ticker.tick(), if ticking => self.coordinator.display_tick(),
            }
            self.flush();
        }

        self.coordinator.shutdown();
        self.flush();
        tracing::info!("Player session closed");
    }

    fn handle_command(&mut self, command: UserCommand) {
        tracing::trace!(?command, "User command");
        let coordinator = &mut self.coordinator;
        match command {
            UserCommand::ViewWillAppear => coordinator.view_will_appear(),
            UserCommand::ViewDidDisappear => coordinator.view_did_disappear(),
            UserCommand::DidEnterBackground => coordinator.did_enter_background(),
            UserCommand::DidBecomeActive => coordinator.did_become_active(),
            UserCommand::Play => coordinator.play_tapped(),
            UserCommand::Pause => coordinator.pause_tapped(),
            UserCommand::SeekSlider { value, phase } => {
                coordinator.seek_slider_changed(value, phase)
            }
            UserCommand::Back => coordinator.back_tapped(),
            UserCommand::Forward => coordinator.forward_tapped(),
            UserCommand::BackToLive => coordinator.back_to_live_tapped(),
            UserCommand::TapToSeek { x, width } => coordinator.tap_to_seek(x, width),
            UserCommand::ToggleControls => coordinator.toggle_controls(ControlsRequest::Toggle),
            UserCommand::DismissError => coordinator.dismiss_error(),
            UserCommand::SliderLayout {
                geometry,
                label_width,
            } => coordinator.set_slider_geometry(geometry, label_width),
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Engine { id, event } => self.coordinator.handle_engine_event(id, event),
            SessionEvent::MetadataFetched { purpose, result } => {
                self.coordinator.metadata_fetched(purpose, result)
            }
            SessionEvent::HideControls { token } => {
                if matches!(self.hide_task, Some((current, _)) if current == token) {
                    self.hide_task = None;
                }
                self.coordinator.hide_fired(token);
            }
        }
    }

    /// Carries out pending effects and publishes the view.
    fn flush(&mut self) {
        for effect in self.coordinator.take_effects() {
            match effect {
                Effect::FetchMetadata(purpose) => {
                    let provider = self.provider.clone();
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        let result = provider.fetch().await;
                        _ = sender.send(SessionEvent::MetadataFetched { purpose, result });
                    });
                }
                Effect::CancelHide { token } => {
                    if let Some((current, task)) = self.hide_task.take() {
                        if current == token {
                            task.abort();
                        } else {
                            self.hide_task = Some((current, task));
                        }
                    }
                }
                Effect::ScheduleHide { token, delay } => {
                    if let Some((_, task)) = self.hide_task.take() {
                        task.abort();
                    }
                    let sender = self.sender.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        _ = sender.send(SessionEvent::HideControls { token });
                    });
                    self.hide_task = Some((token, task));
                }
            }
        }

        let state = self.coordinator.view();
        self.view.send_if_modified(|current| {
            if current != state {
                *current = state.clone();
                true
            } else {
                false
            }
        });
    }
}

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use livevod::{
    engine::mock::{MockCall, MockEngineFactory, MockHandle},
    EngineEvent, LivevodResult, MediaTime, MetadataProvider, PlaybackMode, PlayerSession,
    PlayerSlot, PlayerState, SessionConfig, StreamMetadata, TouchPhase, UserCommand, ViewState,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{init_test_tracing, METADATA};

#[derive(Clone)]
struct StaticProvider {
    metadata: StreamMetadata,
    fetches: Arc<AtomicUsize>,
}

impl MetadataProvider for StaticProvider {
    async fn fetch(&self) -> LivevodResult<StreamMetadata> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata.clone())
    }
}

struct Screen {
    factory: MockEngineFactory,
    fetches: Arc<AtomicUsize>,
    commands: mpsc::UnboundedSender<UserCommand>,
    view: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl Screen {
    fn open(vod_duration: f64) -> Self {
        init_test_tracing();
        let factory =
            MockEngineFactory::new().with_vod_duration(MediaTime::from_seconds(vod_duration));
        let provider = StaticProvider {
            metadata: serde_json::from_str(METADATA).unwrap(),
            fetches: Arc::new(AtomicUsize::new(0)),
        };
        let fetches = provider.fetches.clone();
        let (session, view) = PlayerSession::new(SessionConfig::default(), factory.clone(), provider);
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(session.run(receiver));

        Self {
            factory,
            fetches,
            commands,
            view,
            task,
        }
    }

    fn send(&self, command: UserCommand) {
        self.commands.send(command).unwrap();
    }

    async fn engine(&self, slot: PlayerSlot, count: usize) -> MockHandle {
        for _ in 0..100 {
            let handles = self.factory.handles(slot);
            if handles.len() >= count {
                return handles[count - 1].clone();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{slot} engine #{count} was never created");
    }

    async fn view_until(&mut self, f: impl FnMut(&ViewState) -> bool) -> anyhow::Result<ViewState> {
        let state = tokio::time::timeout(Duration::from_secs(30), self.view.wait_for(f)).await??;
        Ok(state.clone())
    }

    async fn close(self) -> anyhow::Result<()> {
        drop(self.commands);
        self.task.await?;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_session_opens_live() -> anyhow::Result<()> {
    let mut screen = Screen::open(600.0);

    let live = screen.engine(PlayerSlot::Live, 1).await;
    assert_eq!(live.calls().last(), Some(&MockCall::Play));
    assert!(live.emit(EngineEvent::StateChanged(PlayerState::Playing)));

    let state = screen.view_until(|v| v.live_badge_visible).await?;
    assert_eq!(state.mode, PlaybackMode::Live);
    assert!(state.show_pause_button);
    assert_eq!(screen.fetches.load(Ordering::SeqCst), 2);

    let vod = screen.engine(PlayerSlot::Vod, 1).await;
    screen.close().await?;
    assert_eq!(live.calls().last(), Some(&MockCall::Pause));
    assert_eq!(vod.calls().last(), Some(&MockCall::Pause));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_controls_stay_while_scrubbing() -> anyhow::Result<()> {
    let screen = Screen::open(600.0);
    screen.engine(PlayerSlot::Live, 1).await;

    screen.send(UserCommand::ViewWillAppear);
    screen.send(UserCommand::SeekSlider {
        value: 0.5,
        phase: Some(TouchPhase::Began),
    });
    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = screen.view.borrow().clone();
    assert!(state.controls_visible);
    assert_eq!(state.mode, PlaybackMode::Vod);

    screen.send(UserCommand::SeekSlider {
        value: 0.5,
        phase: Some(TouchPhase::Cancelled),
    });
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!screen.view.borrow().controls_visible);

    screen.close().await
}

#[tokio::test(start_paused = true)]
async fn test_events_of_released_live_engine_are_dropped() -> anyhow::Result<()> {
    let mut screen = Screen::open(600.0);
    let first = screen.engine(PlayerSlot::Live, 1).await;

    screen.send(UserCommand::BackToLive);
    let second = screen.engine(PlayerSlot::Live, 2).await;
    assert_eq!(screen.fetches.load(Ordering::SeqCst), 3);

    first.emit(EngineEvent::Error("stale failure".into()));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!screen.view.borrow().error_visible);

    second.emit(EngineEvent::Error("playlist unavailable".into()));
    let state = screen.view_until(|v| v.error_visible).await?;
    assert!(state
        .error_message
        .as_deref()
        .is_some_and(|message| message.contains("playlist unavailable")));
    assert_eq!(state.mode, PlaybackMode::Live);

    screen.send(UserCommand::DismissError);
    screen.view_until(|v| !v.error_visible).await?;
    screen.close().await
}

#[tokio::test(start_paused = true)]
async fn test_seek_completion_through_engine_events() -> anyhow::Result<()> {
    let mut screen = Screen::open(600.0);
    screen.engine(PlayerSlot::Live, 1).await;
    screen.send(UserCommand::ViewWillAppear);

    screen.send(UserCommand::SeekSlider {
        value: 0.25,
        phase: Some(TouchPhase::Ended),
    });
    screen.send(UserCommand::SeekSlider {
        value: 0.5,
        phase: Some(TouchPhase::Ended),
    });
    let state = screen
        .view_until(|v| v.position_label.as_deref() == Some("-5:00"))
        .await?;
    assert_eq!(state.mode, PlaybackMode::Vod);
    assert!(state.recorded_badge_visible);

    let vod = screen.engine(PlayerSlot::Vod, 1).await;
    vod.set_position(MediaTime::from_seconds(100.0));
    vod.emit(EngineEvent::SeekCompleted(MediaTime::from_seconds(150.0)));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(screen.view.borrow().position_label.as_deref(), Some("-5:00"));

    vod.emit(EngineEvent::SeekCompleted(MediaTime::from_seconds(300.0)));
    screen
        .view_until(|v| v.position_label.as_deref() == Some("-8:20"))
        .await?;

    screen.close().await
}

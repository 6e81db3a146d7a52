use std::{fmt, mem, time::Duration};

use tokio::sync::mpsc;
use url::Url;

use crate::{
    config::SessionConfig,
    controls::{ControlsRequest, ControlsTimer},
    display::{buffer_progress, slider_progress, SliderGeometry},
    engine::{
        self, EngineEvent, EngineFactory, EngineId, PlayerDelegate, PlayerHandle, PlayerSlot,
        PlayerState,
    },
    error::{LivevodError, LivevodResult},
    metadata::StreamMetadata,
    seek::{
        back_target, countdown_label, forward_target, is_live_edge, live_back_target,
        normalize_fraction, ForwardTarget, SeekStatus, TouchPhase,
    },
    session::SessionEvent,
    time::MediaTime,
    view::ViewState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackMode {
    Live,
    Vod,
}

impl PlaybackMode {
    pub fn slot(&self) -> PlayerSlot {
        match self {
            PlaybackMode::Live => PlayerSlot::Live,
            PlaybackMode::Vod => PlayerSlot::Vod,
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.slot().fmt(f)
    }
}

/// What a metadata fetch was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPurpose {
    /// First fetch of the screen: primes the VOD engine, then goes live.
    Initial,
    /// Return to live: reload the live engine at the current edge.
    GoLive,
}

/// Work the coordinator cannot do synchronously. Drained by the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchMetadata(FetchPurpose),
    ScheduleHide { token: u64, delay: Duration },
    CancelHide { token: u64 },
}

/// Owns both players and decides which one the user is watching.
///
/// All methods run on the session loop; engine callbacks, metadata results and
/// timer firings reach it only through that loop.
pub struct Coordinator<F>
where
    F: EngineFactory,
{
    config: SessionConfig,
    factory: F,
    sender: mpsc::UnboundedSender<SessionEvent>,

    mode: PlaybackMode,
    live: PlayerHandle<F::Engine>,
    vod: PlayerHandle<F::Engine>,
    seek: SeekStatus,
    /// A requested seek whose engine failed before completing it.
    orphaned_seek: bool,
    metadata: Option<StreamMetadata>,

    controls: ControlsTimer,
    slider: SliderGeometry,
    label_width: f64,
    on_screen: bool,
    paused_on_background: bool,

    view: ViewState,
    effects: Vec<Effect>,
}

impl<F> Coordinator<F>
where
    F: EngineFactory,
{
    pub fn new(
        config: SessionConfig,
        factory: F,
        sender: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            config,
            factory,
            sender,
            mode: PlaybackMode::Live,
            live: PlayerHandle::new(PlayerSlot::Live),
            vod: PlayerHandle::new(PlayerSlot::Vod),
            seek: SeekStatus::None,
            orphaned_seek: false,
            metadata: None,
            controls: ControlsTimer::default(),
            slider: SliderGeometry::default(),
            label_width: 0.0,
            on_screen: false,
            paused_on_background: false,
            view: ViewState::default(),
            effects: Vec::new(),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn seek_status(&self) -> SeekStatus {
        self.seek
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn metadata(&self) -> Option<&StreamMetadata> {
        self.metadata.as_ref()
    }

    pub fn live(&self) -> &PlayerHandle<F::Engine> {
        &self.live
    }

    pub fn vod(&self) -> &PlayerHandle<F::Engine> {
        &self.vod
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }

    /// Whether the display tick should run: the view is on screen and the
    /// engine of the current mode is playing.
    pub fn display_link_active(&self) -> bool {
        self.on_screen && self.active().state() == Some(PlayerState::Playing)
    }

    fn active(&self) -> &PlayerHandle<F::Engine> {
        match self.mode {
            PlaybackMode::Live => &self.live,
            PlaybackMode::Vod => &self.vod,
        }
    }

    // -- lifecycle --

    pub fn view_did_load(&mut self) {
        self.view.position_label = None;
        self.effects.push(Effect::FetchMetadata(FetchPurpose::Initial));
    }

    pub fn view_will_appear(&mut self) {
        self.on_screen = true;
        self.start_controls_timeout();
    }

    pub fn view_did_disappear(&mut self) {
        self.live.pause();
        self.vod.pause();
        self.on_screen = false;
    }

    pub fn did_enter_background(&mut self) {
        let playing = |handle: &PlayerHandle<F::Engine>| {
            handle.state().is_some_and(|state| state.is_active())
        };
        self.paused_on_background = playing(&self.live) || playing(&self.vod);
        if self.paused_on_background {
            tracing::info!(mode = %self.mode, "Pausing playback in background");
            self.live.pause();
            self.vod.pause();
        }
    }

    pub fn did_become_active(&mut self) {
        if !self.paused_on_background {
            return;
        }
        self.paused_on_background = false;
        if self.live.last_error().is_some() || self.vod.last_error().is_some() {
            tracing::info!("Not resuming playback after a player error");
            return;
        }
        match self.mode {
            PlaybackMode::Live => self.start_live_playback(),
            PlaybackMode::Vod => self.start_vod_playback(),
        }
    }

    /// Releases both engines. The coordinator is inert afterwards.
    pub fn shutdown(&mut self) {
        self.live.pause();
        self.vod.pause();
        self.live.discard();
        self.vod.discard();
        self.controls.cancel(&mut self.effects);
        self.on_screen = false;
        tracing::debug!("Players released");
    }

    pub fn metadata_fetched(
        &mut self,
        purpose: FetchPurpose,
        result: LivevodResult<StreamMetadata>,
    ) {
        match result {
            Ok(metadata) => {
                if !metadata.is_channel_live {
                    tracing::info!("Channel is not live, showing the latest recording");
                }
                self.metadata = Some(metadata);
            }
            Err(e) => tracing::error!(?purpose, "Failed to fetch stream metadata: {e}"),
        }
        let Some(metadata) = self.metadata.clone() else {
            tracing::warn!(?purpose, "No stream metadata available, skipping");
            return;
        };

        match purpose {
            FetchPurpose::Initial => {
                match metadata.vod_url(&self.config.distribution_domain) {
                    Ok(url) => self.load_stream(PlayerSlot::Vod, &url),
                    Err(e) => tracing::error!("could not create VOD url: {e}"),
                }
                self.play_live();
            }
            FetchPurpose::GoLive => {
                if self.mode != PlaybackMode::Live {
                    tracing::debug!("Left live before metadata arrived, ignoring");
                    return;
                }
                match metadata.live_url() {
                    Ok(url) => self.load_stream(PlayerSlot::Live, &url),
                    Err(e) => tracing::error!(
                        "could not create url from: {}. {e}",
                        metadata.live_playback_url
                    ),
                }
                self.start_live_playback();
            }
        }
    }

    pub fn handle_engine_event(&mut self, id: EngineId, event: EngineEvent) {
        let handle = match id.slot {
            PlayerSlot::Live => &self.live,
            PlayerSlot::Vod => &self.vod,
        };
        if !handle.accepts(id) {
            tracing::debug!(?id, ?event, "Dropping event from a released player");
            return;
        }
        engine::dispatch(self, id.slot, event);
    }

    // -- user input --

    pub fn play_tapped(&mut self) {
        match self.mode {
            PlaybackMode::Live => self.start_live_playback(),
            PlaybackMode::Vod => self.start_vod_playback(),
        }
    }

    pub fn pause_tapped(&mut self) {
        match self.mode {
            PlaybackMode::Live => self.live.pause(),
            PlaybackMode::Vod => self.vod.pause(),
        }
    }

    pub fn seek_slider_changed(&mut self, value: f32, phase: Option<TouchPhase>) {
        self.view.slider_value = value;
        self.update_label_offset();

        match phase {
            Some(TouchPhase::Began | TouchPhase::Moved) => {
                if self.mode == PlaybackMode::Live && !is_live_edge(value) {
                    self.enter_vod(None);
                }
                self.set_seek(SeekStatus::Choosing(value));
            }
            Some(TouchPhase::Ended) | None => self.seek_slider_released(value),
            Some(TouchPhase::Cancelled) => self.set_seek(SeekStatus::None),
        }
    }

    pub fn back_to_live_tapped(&mut self) {
        self.play_live();
        self.toggle_controls(ControlsRequest::Show);
    }

    pub fn back_tapped(&mut self) {
        let step = self.config.skip_step();
        match self.mode {
            PlaybackMode::Live => {
                let duration = self.vod.duration().unwrap_or(MediaTime::INVALID);
                match live_back_target(duration, step) {
                    Some(target) => self.enter_vod(Some(target)),
                    None => tracing::warn!("Recording duration unknown, staying live"),
                }
            }
            PlaybackMode::Vod => {
                if let (Some(position), Some(duration)) =
                    (self.current_position(), self.vod.duration())
                {
                    self.seek_to(back_target(position, duration, step));
                }
            }
        }
    }

    pub fn forward_tapped(&mut self) {
        if self.mode == PlaybackMode::Live || !self.view.forward_enabled {
            return;
        }
        let (Some(position), Some(duration)) = (self.current_position(), self.vod.duration())
        else {
            return;
        };
        match forward_target(position, duration, self.config.skip_step()) {
            ForwardTarget::Seek(target) => self.seek_to(target),
            ForwardTarget::GoLive => self.play_live(),
        }
    }

    /// Tap on the seek track at `x` of a track `width` points wide.
    pub fn tap_to_seek(&mut self, x: f64, width: f64) {
        if width <= 0.0 {
            return;
        }
        let fraction = (x / width).clamp(0.0, 1.0) as f32;
        self.view.slider_value = fraction;
        self.seek_slider_released(fraction);
    }

    pub fn toggle_controls(&mut self, request: ControlsRequest) {
        let visible = match request {
            ControlsRequest::Show => true,
            ControlsRequest::Hide => false,
            ControlsRequest::Toggle => !self.view.controls_visible,
        };
        self.view.controls_visible = visible;
        if visible && request != ControlsRequest::Hide {
            self.start_controls_timeout();
        }
        self.refresh_back_to_live();
    }

    pub fn hide_fired(&mut self, token: u64) {
        if !self.controls.fire(token) {
            tracing::trace!(token, "Ignoring superseded hide timer");
            return;
        }
        if self.seek.is_pending() {
            self.start_controls_timeout();
        } else {
            self.toggle_controls(ControlsRequest::Hide);
        }
    }

    pub fn dismiss_error(&mut self) {
        self.view.error_visible = false;
    }

    pub fn set_slider_geometry(&mut self, geometry: SliderGeometry, label_width: f64) {
        self.slider = geometry;
        self.label_width = label_width;
        self.update_label_offset();
    }

    pub fn display_tick(&mut self) {
        self.update_position_display();
        self.update_buffer_progress();
    }

    // -- transitions --

    /// Leaves VOD (or refreshes live): the live engine is recreated from freshly
    /// fetched metadata so playback starts at the current edge.
    fn play_live(&mut self) {
        tracing::info!("Playing LIVE");
        self.vod.pause();
        if self.live.discard().is_some() {
            tracing::debug!("Live player released");
        }
        self.mode = PlaybackMode::Live;
        self.orphaned_seek = false;
        self.set_seek(SeekStatus::None);
        self.view.mode = PlaybackMode::Live;
        self.view.forward_enabled = false;
        self.view.recorded_badge_visible = false;
        self.view.position_label_visible = false;
        self.view.slider_value = 1.0;
        self.effects.push(Effect::FetchMetadata(FetchPurpose::GoLive));
        self.update_position_display();
        self.refresh_back_to_live();
    }

    /// Switches to the recording, optionally seeking to `target` first.
    fn enter_vod(&mut self, target: Option<MediaTime>) {
        if !self.vod.is_loaded() {
            tracing::warn!("Recording is not loaded yet, staying {}", self.mode);
            return;
        }
        match target {
            Some(target) => tracing::info!("Playing VOD at {target}"),
            None => tracing::info!("Playing VOD"),
        }
        if self.mode == PlaybackMode::Live {
            self.orphaned_seek = false;
            self.set_seek(SeekStatus::None);
        }
        self.view.forward_enabled = true;
        if let Some(target) = target {
            self.seek_to(target);
        }
        self.start_vod_playback();
        self.update_position_display();
    }

    fn start_live_playback(&mut self) {
        self.mode = PlaybackMode::Live;
        self.view.mode = PlaybackMode::Live;
        self.view.position_label_visible = false;
        self.view.recorded_badge_visible = false;
        self.view.slider_value = 1.0;
        self.vod.pause();
        self.live.play();
        self.apply_duration(MediaTime::INDEFINITE);
        self.refresh_back_to_live();
    }

    fn start_vod_playback(&mut self) {
        self.mode = PlaybackMode::Vod;
        self.view.mode = PlaybackMode::Vod;
        self.view.position_label_visible = true;
        self.view.live_badge_visible = false;
        self.view.recorded_badge_visible = true;
        self.live.pause();
        self.vod.play();
        self.apply_duration(self.vod.duration().unwrap_or(MediaTime::INVALID));
        self.refresh_back_to_live();
    }

    fn seek_slider_released(&mut self, value: f32) {
        if is_live_edge(value) {
            if self.mode == PlaybackMode::Live {
                self.set_seek(SeekStatus::None);
            } else {
                self.play_live();
            }
        } else if self.mode == PlaybackMode::Live {
            let target = self.fraction_target(value);
            self.enter_vod(target);
        } else {
            self.seek_to_fraction(value);
        }

        match self.mode {
            PlaybackMode::Live => self.start_live_playback(),
            PlaybackMode::Vod => self.start_vod_playback(),
        }
    }

    fn fraction_target(&self, fraction: f32) -> Option<MediaTime> {
        self.vod
            .duration()
            .filter(MediaTime::is_numeric)
            .map(|duration| duration.mul_f64(f64::from(normalize_fraction(fraction))))
    }

    fn seek_to_fraction(&mut self, fraction: f32) {
        match self.fraction_target(fraction) {
            Some(position) => self.seek_to(position),
            None => self.set_seek(SeekStatus::None),
        }
    }

    fn seek_to(&mut self, position: MediaTime) {
        if !self.vod.is_loaded() {
            self.set_seek(SeekStatus::None);
            return;
        }
        self.orphaned_seek = false;
        self.set_seek(SeekStatus::Requested(position));
        self.vod.seek(position);
    }

    fn set_seek(&mut self, status: SeekStatus) {
        self.seek = status;
        self.update_position_display();
        self.refresh_back_to_live();
    }

    fn load_stream(&mut self, slot: PlayerSlot, url: &Url) {
        let handle = match slot {
            PlayerSlot::Live => &mut self.live,
            PlayerSlot::Vod => &mut self.vod,
        };
        let created = !handle.is_loaded();
        handle.load(&self.factory, &self.sender, url);
        if created {
            self.set_seek(SeekStatus::None);
        }
    }

    // -- derived view state --

    fn current_position(&self) -> Option<MediaTime> {
        let (position, duration) = (self.vod.position()?, self.vod.duration()?);
        Some(self.seek.displayed_position(position, duration))
    }

    fn update_position_display(&mut self) {
        let (Some(reported), Some(duration)) = (self.vod.position(), self.vod.duration()) else {
            self.view.position_label = None;
            return;
        };
        let position = self.seek.displayed_position(reported, duration);
        if self.seek == SeekStatus::None && self.mode == PlaybackMode::Vod {
            if let Some(progress) = slider_progress(position, duration) {
                self.view.slider_value = progress;
            }
        }
        if let Some(label) = countdown_label(position, duration) {
            self.view.position_label = Some(label);
        }
        self.update_label_offset();
    }

    fn update_buffer_progress(&mut self) {
        self.view.buffer_progress = match (self.vod.duration(), self.vod.buffered()) {
            (Some(duration), Some(buffered)) => buffer_progress(duration, buffered),
            _ => 0.0,
        };
    }

    fn update_label_offset(&mut self) {
        self.view.position_label_offset = self
            .slider
            .label_offset(self.view.slider_value, self.label_width);
    }

    fn apply_duration(&mut self, duration: MediaTime) {
        if duration.is_indefinite() {
            self.view.seek_slider_visible = true;
            self.view.buffer_bar_visible = false;
            self.view.buffer_progress = 0.0;
        } else if duration.is_numeric() {
            self.view.seek_slider_visible = true;
            self.view.buffer_bar_visible = true;
            self.update_buffer_progress();
        } else {
            self.view.seek_slider_visible = false;
            self.view.buffer_bar_visible = false;
            self.view.buffer_progress = 0.0;
        }
    }

    fn refresh_back_to_live(&mut self) {
        self.view.back_to_live_visible = self.view.controls_visible
            && self.mode == PlaybackMode::Vod
            && !matches!(self.seek, SeekStatus::Choosing(_));
    }

    fn start_controls_timeout(&mut self) {
        self.controls
            .schedule(self.config.controls_timeout(), &mut self.effects);
    }
}

impl<F> PlayerDelegate for Coordinator<F>
where
    F: EngineFactory,
{
    fn did_change_state(&mut self, slot: PlayerSlot, state: PlayerState) {
        tracing::debug!(%slot, ?state, "Player state changed");

        if slot == PlayerSlot::Vod
            && self.orphaned_seek
            && matches!(state, PlayerState::Ready | PlayerState::Playing)
        {
            tracing::info!("Clearing seek left behind by a player error");
            self.orphaned_seek = false;
            self.set_seek(SeekStatus::None);
        }

        if slot != self.mode.slot() {
            return;
        }
        let live = self.mode == PlaybackMode::Live;
        self.view.show_pause_button = state.is_active();
        self.view.buffering = state == PlayerState::Buffering;
        if live {
            self.view.slider_value = 1.0;
        }
        if state == PlayerState::Playing {
            self.view.live_badge_visible = live;
            self.view.recorded_badge_visible = !live;
        } else {
            self.view.live_badge_visible = false;
        }
        self.view.position_label_visible = !live;
    }

    fn did_change_duration(&mut self, slot: PlayerSlot, duration: MediaTime) {
        tracing::debug!(%slot, %duration, "Player duration changed");
        if slot == self.mode.slot() {
            self.apply_duration(duration);
        }
    }

    fn did_fail(&mut self, slot: PlayerSlot, message: String) {
        tracing::error!(%slot, "Player failed: {message}");
        let error = LivevodError::PlaybackError {
            slot,
            message: message.clone(),
        };
        match slot {
            PlayerSlot::Live => self.live.set_error(message),
            PlayerSlot::Vod => self.vod.set_error(message),
        }
        if slot == PlayerSlot::Vod && matches!(self.seek, SeekStatus::Requested(_)) {
            tracing::warn!(seek = ?self.seek, "Pending seek orphaned by player error");
            self.orphaned_seek = true;
        }
        self.view.error_message = Some(error.to_string());
        self.view.error_visible = true;
    }

    fn did_complete_seek(&mut self, slot: PlayerSlot, position: MediaTime) {
        if slot != PlayerSlot::Vod {
            return;
        }
        if self.seek.is_settled_by(position) {
            self.set_seek(SeekStatus::None);
        } else {
            tracing::debug!(%position, seek = ?self.seek, "Ignoring completion of a superseded seek");
        }
    }
}

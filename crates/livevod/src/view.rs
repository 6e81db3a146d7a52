use crate::coordinator::PlaybackMode;

/// Everything the view layer renders. Only the coordinator's transition
/// functions write to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Selects the visible player surface.
    pub mode: PlaybackMode,

    pub live_badge_visible: bool,
    pub recorded_badge_visible: bool,
    pub back_to_live_visible: bool,
    /// Control buttons, seek bar and gradient.
    pub controls_visible: bool,

    pub show_pause_button: bool,
    pub buffering: bool,
    pub forward_enabled: bool,

    pub seek_slider_visible: bool,
    pub slider_value: f32,
    pub buffer_bar_visible: bool,
    pub buffer_progress: f64,

    pub position_label: Option<String>,
    pub position_label_visible: bool,
    pub position_label_offset: f64,

    pub error_message: Option<String>,
    pub error_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Live,
            live_badge_visible: false,
            recorded_badge_visible: false,
            back_to_live_visible: false,
            controls_visible: true,
            show_pause_button: false,
            buffering: false,
            forward_enabled: false,
            seek_slider_visible: true,
            slider_value: 1.0,
            buffer_bar_visible: false,
            buffer_progress: 0.0,
            position_label: None,
            position_label_visible: false,
            position_label_offset: 0.0,
            error_message: None,
            error_visible: false,
        }
    }
}

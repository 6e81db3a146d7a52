use crate::time::MediaTime;

/// Share of the recording already buffered, 0 when either side is unknown.
pub fn buffer_progress(duration: MediaTime, buffered: MediaTime) -> f64 {
    if !duration.is_normal() || !buffered.is_numeric() {
        return 0.0;
    }
    let scaled = buffered.convert_scale(duration.timescale());
    (scaled.value() as f64 / duration.value() as f64).clamp(0.0, 1.0)
}

pub fn slider_progress(position: MediaTime, duration: MediaTime) -> Option<f32> {
    if !duration.is_normal() || !position.is_numeric() {
        return None;
    }
    let scaled = position.convert_scale(duration.timescale());
    Some((scaled.value() as f64 / duration.value() as f64).clamp(0.0, 1.0) as f32)
}

/// Layout of the seek slider, in points of its parent view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SliderGeometry {
    pub origin_x: f64,
    pub track_x: f64,
    pub track_width: f64,
    pub thumb_width: f64,
}

impl SliderGeometry {
    pub fn thumb_x(&self, value: f32) -> f64 {
        let travel = (self.track_width - self.thumb_width).max(0.0);
        self.track_x + f64::from(value.clamp(0.0, 1.0)) * travel
    }

    /// Leading offset of the time label so it follows the thumb.
    pub fn label_offset(&self, value: f32, label_width: f64) -> f64 {
        (self.thumb_x(value) + self.origin_x - label_width / 3.0).max(0.0)
    }
}

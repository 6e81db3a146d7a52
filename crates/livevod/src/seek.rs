use crate::time::MediaTime;

/// Smallest fraction sent to the engine. Seeking to exactly zero is read as
/// the live edge by engines with ambiguous duration semantics.
pub const MIN_SEEK_FRACTION: f32 = 0.000_001;

/// Phase of a touch on the seek slider, when the change came from one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// Pending seek interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SeekStatus {
    #[default]
    None,
    /// The user is dragging the slider; nothing was sent to the engine yet.
    Choosing(f32),
    /// A seek was issued and has not completed.
    Requested(MediaTime),
}

impl SeekStatus {
    pub fn is_pending(&self) -> bool {
        !matches!(self, SeekStatus::None)
    }

    /// Whether a completion for `position` settles this status. Completions of
    /// superseded seeks do not match.
    pub fn is_settled_by(&self, position: MediaTime) -> bool {
        matches!(self, SeekStatus::Requested(requested) if *requested == position)
    }

    /// Requested target, then drag fraction, then the engine's own position.
    pub fn displayed_position(&self, reported: MediaTime, duration: MediaTime) -> MediaTime {
        match self {
            SeekStatus::Requested(position) => *position,
            SeekStatus::Choosing(fraction) => duration.mul_f64(f64::from(*fraction)),
            SeekStatus::None => reported,
        }
    }
}

pub fn normalize_fraction(fraction: f32) -> f32 {
    if fraction <= 0.0 {
        MIN_SEEK_FRACTION
    } else {
        fraction.min(1.0)
    }
}

/// The right edge of the slider always means live.
pub fn is_live_edge(fraction: f32) -> bool {
    fraction >= 1.0
}

/// Remaining time as shown next to the slider thumb, e.g. `-1:05`.
pub fn countdown_label(position: MediaTime, duration: MediaTime) -> Option<String> {
    if !position.is_normal() || !duration.is_normal() {
        return None;
    }
    Some(format!("-{}", duration.saturating_sub(position).clock()))
}

/// Earliest position sent to the engine for a recording of `duration`.
pub fn seek_floor(duration: MediaTime) -> MediaTime {
    duration.mul_f64(f64::from(MIN_SEEK_FRACTION))
}

/// One step back from `position`, kept above [`seek_floor`].
pub fn back_target(position: MediaTime, duration: MediaTime, step: MediaTime) -> MediaTime {
    let target = position.saturating_sub(step);
    let floor = seek_floor(duration);
    if floor.is_normal() && target.seconds() < floor.seconds() {
        floor
    } else {
        target
    }
}

/// Target for "back" while live: one step before the recorded edge.
pub fn live_back_target(vod_duration: MediaTime, step: MediaTime) -> Option<MediaTime> {
    vod_duration
        .is_normal()
        .then(|| back_target(vod_duration, vod_duration, step))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ForwardTarget {
    Seek(MediaTime),
    /// Stepping forward would pass the recorded edge.
    GoLive,
}

pub fn forward_target(position: MediaTime, duration: MediaTime, step: MediaTime) -> ForwardTarget {
    let target = position + step;
    if target.is_numeric() && duration.is_numeric() && target.seconds() < duration.seconds() {
        ForwardTarget::Seek(target)
    } else {
        ForwardTarget::GoLive
    }
}

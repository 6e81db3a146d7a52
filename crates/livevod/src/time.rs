use std::{
    fmt,
    ops::{Add, Sub},
};

/// Timescale used when a time is built from seconds.
pub const DEFAULT_TIMESCALE: i32 = 600;
/// Minimum timescale of scaled results, so tiny fractions stay non-zero.
pub const FINE_TIMESCALE: i32 = 1_000_000;

/// Rational media timestamp, `value / timescale` seconds.
///
/// Equality compares the rational values, so `1/1` equals `600/600`. Seek
/// targets are matched against completions this way.
#[derive(Clone, Copy, Debug)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
}

impl MediaTime {
    pub const ZERO: Self = Self {
        value: 0,
        timescale: 1,
    };
    pub const INVALID: Self = Self {
        value: 0,
        timescale: 0,
    };
    /// Duration of an ongoing live stream.
    pub const INDEFINITE: Self = Self {
        value: i64::MAX,
        timescale: 1,
    };

    pub fn new(value: i64, timescale: i32) -> Self {
        Self { value, timescale }
    }

    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() {
            return Self::INVALID;
        }
        Self {
            value: (seconds * f64::from(DEFAULT_TIMESCALE)).round() as i64,
            timescale: DEFAULT_TIMESCALE,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn timescale(&self) -> i32 {
        self.timescale
    }

    pub fn seconds(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        if self.is_indefinite() {
            return f64::INFINITY;
        }
        self.value as f64 / f64::from(self.timescale)
    }

    pub fn is_valid(&self) -> bool {
        self.timescale > 0
    }

    pub fn is_indefinite(&self) -> bool {
        self.is_valid() && self.value == i64::MAX
    }

    /// Valid and finite.
    pub fn is_numeric(&self) -> bool {
        self.is_valid() && !self.is_indefinite()
    }

    /// Numeric and non-zero.
    pub fn is_normal(&self) -> bool {
        self.is_numeric() && self.value != 0
    }

    pub fn mul_f64(self, multiplier: f64) -> Self {
        if !self.is_numeric() || !multiplier.is_finite() {
            return self;
        }
        let scaled = self.convert_scale(self.timescale.max(FINE_TIMESCALE));
        Self {
            value: (scaled.value as f64 * multiplier).round() as i64,
            timescale: scaled.timescale,
        }
    }

    pub fn convert_scale(self, timescale: i32) -> Self {
        if !self.is_numeric() || timescale <= 0 || timescale == self.timescale {
            return self;
        }
        let value = i128::from(self.value) * i128::from(timescale) / i128::from(self.timescale);
        Self {
            value: value as i64,
            timescale,
        }
    }

    /// Subtraction floored at zero.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let result = self - rhs;
        if result.is_numeric() && result.value < 0 {
            Self {
                value: 0,
                timescale: result.timescale,
            }
        } else {
            result
        }
    }

    /// Countdown text, `H:MM:SS` from one hour upward and `M:SS` below.
    pub fn clock(&self) -> String {
        let total = self.seconds().max(0.0) as u64;
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        if total >= 3600 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }

    fn combine(self, rhs: Self, op: impl Fn(i64, i64) -> i64) -> Self {
        if !self.is_valid() || !rhs.is_valid() {
            return Self::INVALID;
        }
        if self.is_indefinite() || rhs.is_indefinite() {
            return Self::INDEFINITE;
        }
        let rhs = rhs.convert_scale(self.timescale);
        Self {
            value: op(self.value, rhs.value),
            timescale: self.timescale,
        }
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => true,
            (true, true) if self.is_indefinite() || other.is_indefinite() => {
                self.is_indefinite() == other.is_indefinite()
            }
            (true, true) => {
                i128::from(self.value) * i128::from(other.timescale)
                    == i128::from(other.value) * i128::from(self.timescale)
            }
            _ => false,
        }
    }
}

impl Eq for MediaTime {}

impl Default for MediaTime {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Add for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs, i64::saturating_add)
    }
}

impl Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: Self) -> Self::Output {
        self.combine(rhs, i64::saturating_sub)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "invalid")
        } else if self.is_indefinite() {
            write!(f, "indefinite")
        } else {
            write!(f, "{:.3}s", self.seconds())
        }
    }
}

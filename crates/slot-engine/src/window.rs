//! Sampling window policy: business-friendly padding and morning/afternoon bias.
//!
//! A minute is sampled uniformly from the raw `[open, close]` window and then
//! pulled into the effective window with [`SamplingWindow::apply`]. Bounds
//! that cross (padding wider than the window) collapse onto the lower bound,
//! so the result is always defined.

use crate::config::SlotConfig;

/// Upper limit on padding, in minutes.
pub const MAX_PADDING: i64 = 60;

/// Which half of the padded window slots are pulled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    None,
    Morning,
    Afternoon,
}

impl Bias {
    /// Both flags set cancel out, as does neither.
    pub fn from_flags(morning: bool, afternoon: bool) -> Self {
        match (morning, afternoon) {
            (true, false) => Bias::Morning,
            (false, true) => Bias::Afternoon,
            _ => Bias::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    /// Raw window, minutes since midnight.
    pub open: i64,
    pub close: i64,
    /// Padding applied to each end, 0 when padding is off.
    pub padding: i64,
    pub bias: Bias,
}

impl SamplingWindow {
    pub fn from_config(config: &SlotConfig) -> Self {
        let padding = if config.biz_friendly_padding {
            padding_for(config.interval)
        } else {
            0
        };
        Self {
            open: i64::from(config.open_minute()),
            close: i64::from(config.close_minute()),
            padding,
            bias: Bias::from_flags(config.morning_bias, config.afternoon_bias),
        }
    }

    /// The window after padding, with crossed bounds collapsed onto the lower one.
    pub fn padded(&self) -> (i64, i64) {
        let lo = self.open + self.padding;
        let hi = self.close - self.padding;
        (lo, hi.max(lo))
    }

    /// The half of the padded window selected by the bias.
    pub fn biased(&self) -> (i64, i64) {
        let (lo, hi) = self.padded();
        let mid = (lo + hi).div_euclid(2);
        match self.bias {
            Bias::None => (lo, hi),
            Bias::Morning => (lo, mid),
            Bias::Afternoon => (mid + 1, hi),
        }
    }

    /// Pull a sampled minute into the padded window, then into the biased half.
    pub fn apply(&self, minute: i64) -> i64 {
        let minute = if self.padding > 0 {
            let (lo, hi) = (self.open + self.padding, self.close - self.padding);
            clamp_lower_wins(minute, lo, hi)
        } else {
            minute
        };
        match self.bias {
            Bias::None => minute,
            _ => {
                let (lo, hi) = self.biased();
                clamp_lower_wins(minute, lo, hi)
            }
        }
    }
}

/// Padding for a given snap interval: half the interval plus half an hour,
/// capped at [`MAX_PADDING`].
pub fn padding_for(interval: u32) -> i64 {
    (i64::from(interval) / 2 + 30).min(MAX_PADDING)
}

/// `max(lo, min(hi, v))`. Unlike `Ord::clamp` this does not panic when
/// `lo > hi`; the lower bound wins.
fn clamp_lower_wins(v: i64, lo: i64, hi: i64) -> i64 {
    v.min(hi).max(lo)
}

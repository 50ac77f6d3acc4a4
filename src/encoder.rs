//! This module implements the interval encoder mapping scalars to spike timing.

use serde::{Deserialize, Serialize};

use super::error::StickError;

/// Maps a normalized scalar `x` in `[0, 1]` to the interval between two
/// spikes, and back: `interval(x) = Tmin + x * Tcod`.
///
/// # Examples
///
/// ```rust
/// use stick_snn::encoder::Encoder;
///
/// let enc = Encoder::build(10.0, 100.0).unwrap();
/// let interval = enc.encode_interval(0.5);
/// assert_eq!(interval, 60.0);
/// assert!((enc.decode_interval(interval) - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct Encoder {
    // The minimum spike interval, encoding x = 0.
    t_min: f64,
    // The coding span; x = 1 is encoded as t_min + t_cod.
    t_cod: f64,
}

impl Encoder {
    /// Create an encoder with the specified timing parameters.
    /// The function returns an error unless both are strictly positive.
    pub fn build(t_min: f64, t_cod: f64) -> Result<Self, StickError> {
        if !(t_min > 0.0 && t_cod > 0.0) {
            return Err(StickError::InvalidEncoderConfig { t_min, t_cod });
        }
        Ok(Encoder { t_min, t_cod })
    }

    /// Returns the minimum spike interval.
    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    /// Returns the coding span.
    pub fn t_cod(&self) -> f64 {
        self.t_cod
    }

    /// Returns the spike interval encoding the normalized value `x`.
    pub fn encode_interval(&self, x: f64) -> f64 {
        self.t_min + x * self.t_cod
    }

    /// Returns the normalized value encoded by the given spike interval.
    pub fn decode_interval(&self, interval: f64) -> f64 {
        (interval - self.t_min) / self.t_cod
    }

    /// Returns the pair of spike times (relative to the first spike)
    /// encoding the normalized value `x`.
    pub fn encode_spike_times(&self, x: f64) -> [f64; 2] {
        [0.0, self.encode_interval(x)]
    }
}

impl Default for Encoder {
    /// The reference timing: `Tmin = 10`, `Tcod = 100`.
    fn default() -> Self {
        Encoder {
            t_min: 10.0,
            t_cod: 100.0,
        }
    }
}

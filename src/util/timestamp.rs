//! Timestamp handling between the caller's time base and the decoder's
//!
//! Buffers arrive stamped in microseconds. Hardware decoders run on the
//! MPEG 90 kHz clock, so every timestamp is rescaled once on `load` and
//! carried in 90 kHz ticks from then on.

use std::fmt;

/// Ticks per second of the caller's clock (microseconds)
pub const EXTERNAL_TIME_BASE: i64 = 1_000_000;

/// Ticks per second of the decoder clock
pub const DECODER_TIME_BASE: i64 = 90_000;

/// A timestamp in decoder (90 kHz) ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub value: i64,
}

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Timestamp { value }
    }

    /// Unknown presentation time
    pub fn none() -> Self {
        Timestamp { value: i64::MIN }
    }

    pub fn is_valid(&self) -> bool {
        self.value != i64::MIN
    }

    /// Convert a caller timestamp in microseconds
    ///
    /// Negative values are treated as "unknown", matching how the buffer
    /// producers signal a missing timestamp.
    pub fn from_micros(micros: i64) -> Self {
        if micros < 0 {
            return Self::none();
        }
        let ticks = (micros as i128 * DECODER_TIME_BASE as i128) / EXTERNAL_TIME_BASE as i128;
        Timestamp {
            value: ticks as i64,
        }
    }

    /// Convert back to microseconds, `None` for an invalid timestamp
    pub fn to_micros(&self) -> Option<i64> {
        if !self.is_valid() {
            return None;
        }
        let micros = (self.value as i128 * EXTERNAL_TIME_BASE as i128) / DECODER_TIME_BASE as i128;
        Some(micros as i64)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "NOPTS")
        }
    }
}

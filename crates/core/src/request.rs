// crates/core/src/request.rs
use serde::{Deserialize, Serialize};

use crate::{RetortError, RetortResult};

/// User-chosen aggressiveness on a 1..=10 scale.
///
/// Construction never fails: values outside the range are clamped to the nearest bound,
/// so re-wrapping an existing level is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct IntensityLevel(u8);

impl IntensityLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const DEFAULT: u8 = 5;

    pub fn new(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Lenient conversion for JSON numbers. Fractions are truncated toward zero and
    /// non-finite values fall back to the default level.
    pub fn from_f64(level: f64) -> Self {
        if level.is_finite() {
            // `as` saturates, so huge magnitudes land on the bounds
            Self::new(level.trunc() as i64)
        } else {
            Self::default()
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in the tone table, always within `0..=9`.
    pub fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }
}

impl Default for IntensityLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<i64> for IntensityLevel {
    fn from(level: i64) -> Self {
        Self::new(level)
    }
}

impl From<IntensityLevel> for i64 {
    fn from(level: IntensityLevel) -> Self {
        level.0 as i64
    }
}

impl std::fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user action: what the other party said and how hard to hit back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    utterance: String,
    intensity: IntensityLevel,
}

impl GenerationRequest {
    /// Trims the utterance and rejects it if nothing is left.
    pub fn new(utterance: &str, intensity: IntensityLevel) -> RetortResult<Self> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(RetortError::InvalidRequest(
                "utterance must not be empty".to_string(),
            ));
        }

        Ok(Self {
            utterance: utterance.to_string(),
            intensity,
        })
    }

    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    pub fn intensity(&self) -> IntensityLevel {
        self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_levels() {
        assert_eq!(IntensityLevel::new(0).get(), 1);
        assert_eq!(IntensityLevel::new(-42).get(), 1);
        assert_eq!(IntensityLevel::new(11).get(), 10);
        assert_eq!(IntensityLevel::new(i64::MAX).get(), 10);
        assert_eq!(IntensityLevel::new(7).get(), 7);
    }

    #[test]
    fn clamping_is_idempotent() {
        for raw in -5..=15 {
            let once = IntensityLevel::new(raw);
            let twice = IntensityLevel::new(once.get() as i64);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn index_covers_tone_table() {
        assert_eq!(IntensityLevel::new(1).index(), 0);
        assert_eq!(IntensityLevel::new(9).index(), 8);
        assert_eq!(IntensityLevel::new(10).index(), 9);
    }

    #[test]
    fn lenient_float_conversion() {
        assert_eq!(IntensityLevel::from_f64(3.9).get(), 3);
        assert_eq!(IntensityLevel::from_f64(-0.5).get(), 1);
        assert_eq!(IntensityLevel::from_f64(1e300).get(), 10);
        assert_eq!(IntensityLevel::from_f64(f64::NAN), IntensityLevel::default());
    }

    #[test]
    fn deserializes_and_clamps_from_json() {
        let level: IntensityLevel = serde_json::from_str("42").unwrap();
        assert_eq!(level.get(), 10);
        assert_eq!(serde_json::to_string(&level).unwrap(), "10");
    }

    #[test]
    fn request_trims_utterance() {
        let request = GenerationRequest::new("  你怎么这么笨 \n", IntensityLevel::new(9)).unwrap();
        assert_eq!(request.utterance(), "你怎么这么笨");
        assert_eq!(request.intensity().get(), 9);
    }

    #[test]
    fn blank_utterance_is_invalid() {
        for input in ["", "   ", "\n\t"] {
            let err = GenerationRequest::new(input, IntensityLevel::default()).unwrap_err();
            assert!(matches!(err, RetortError::InvalidRequest(_)));
            assert!(err.is_client_error());
        }
    }
}

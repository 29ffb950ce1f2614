//! Magnitude normalization shared by every variant.

use crate::error::{Result, VisualizerError};

/// Map `value` from `[min, max]` onto `[0, 1]`.
///
/// Non-finite when `max == min`; use [`MagnitudeRange`] when the range is not a
/// compile-time constant.
pub fn normalize(min: f32, max: f32, value: f32) -> f32 {
    (value - min) / (max - min)
}

/// Validated, non-degenerate magnitude range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeRange {
    min: f32,
    max: f32,
}

impl MagnitudeRange {
    /// Full range of 8-bit analyser output
    pub const BYTE: Self = Self {
        min: 0.0,
        max: 255.0,
    };

    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min == max {
            return Err(VisualizerError::DegenerateRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Range of an unsigned magnitude with the given bit depth: `[0, 2^bits - 1]`
    pub fn for_bit_depth(bits: u32) -> Result<Self> {
        if bits == 0 || bits > 24 {
            return Err(VisualizerError::InvalidConfig(format!(
                "magnitude bit depth must be in 1..=24, got {}",
                bits
            )));
        }
        Self::new(0.0, ((1u32 << bits) - 1) as f32)
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn normalize(&self, value: f32) -> f32 {
        normalize(self.min, self.max, value)
    }
}

impl Default for MagnitudeRange {
    fn default() -> Self {
        Self::BYTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize(0.0, 255.0, 0.0), 0.0);
        assert_eq!(normalize(0.0, 255.0, 255.0), 1.0);
        assert_eq!(normalize(-10.0, 10.0, -10.0), 0.0);
        assert_eq!(normalize(-10.0, 10.0, 10.0), 1.0);
    }

    #[test]
    fn test_normalize_midpoint_example() {
        assert_relative_eq!(normalize(0.0, 255.0, 127.0), 0.498, epsilon = 1e-3);
    }

    #[test]
    fn test_normalize_monotonic_and_bounded_over_bytes() {
        let mut previous = f32::NEG_INFINITY;
        for v in 0..=255u8 {
            let f = normalize(0.0, 255.0, v as f32);
            assert!((0.0..=1.0).contains(&f), "{} maps outside [0,1]: {}", v, f);
            assert!(f > previous, "not increasing at {}", v);
            previous = f;
        }
    }

    #[test]
    fn test_normalize_degenerate_is_not_finite() {
        assert!(!normalize(3.0, 3.0, 1.0).is_finite());
    }

    #[test]
    fn test_range_rejects_degenerate() {
        assert!(matches!(
            MagnitudeRange::new(5.0, 5.0),
            Err(VisualizerError::DegenerateRange { .. })
        ));
        assert!(MagnitudeRange::new(0.0, f32::NAN).is_err());
    }

    #[test]
    fn test_range_from_bit_depth() {
        assert_eq!(MagnitudeRange::for_bit_depth(8).unwrap(), MagnitudeRange::BYTE);
        assert_eq!(MagnitudeRange::for_bit_depth(16).unwrap().max(), 65535.0);
        assert!(MagnitudeRange::for_bit_depth(0).is_err());
    }

    #[test]
    fn test_range_normalize_matches_free_function() {
        let range = MagnitudeRange::new(10.0, 20.0).unwrap();
        assert_relative_eq!(range.normalize(15.0), 0.5);
        assert_eq!(MagnitudeRange::default().normalize(255.0), 1.0);
    }
}

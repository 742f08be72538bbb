use serde::{Deserialize, Serialize};

use crate::shared::error::ConfigError;

/// Box size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: u32,
    pub height: u32,
}

impl BoxSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Multi-scale search parameters for one feature class.
///
/// Built once at startup and shared read-only for the life of the loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Pyramid step between scales; must exceed 1.0.
    pub scale_factor: f64,
    /// Overlapping hits required to keep a candidate.
    pub min_neighbors: u32,
    /// Backend-specific search flags, passed through untouched.
    #[serde(default)]
    pub flags: i32,
    pub min_size: BoxSize,
    /// `None` leaves the upper bound to the detector.
    #[serde(default)]
    pub max_size: Option<BoxSize>,
}

impl DetectionParams {
    pub fn faces() -> Self {
        Self {
            scale_factor: 1.2,
            min_neighbors: 4,
            flags: 0,
            min_size: BoxSize::new(150, 150),
            max_size: None,
        }
    }

    pub fn eyes() -> Self {
        Self {
            scale_factor: 1.2,
            min_neighbors: 7,
            flags: 0,
            min_size: BoxSize::new(25, 15),
            max_size: Some(BoxSize::new(90, 70)),
        }
    }

    pub fn validate(&self, class: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidParams {
            class: class.to_string(),
            reason,
        };
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(invalid(format!(
                "scale factor must be greater than 1.0, got {}",
                self.scale_factor
            )));
        }
        if let Some(max) = self.max_size {
            if max.width < self.min_size.width || max.height < self.min_size.height {
                return Err(invalid(format!(
                    "max size {}x{} is smaller than min size {}x{}",
                    max.width, max.height, self.min_size.width, self.min_size.height
                )));
            }
        }
        Ok(())
    }
}

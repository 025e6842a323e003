use glam::Vec3;

use crate::error::ConfigError;

/// Parameters of a growth session. Fixed once the engine is built.
///
/// Extents follow the axis mapping `range_length` → x,
/// `range_width` → y, `range_height` → z. The box is centred on the
/// origin, so each axis spans `[-extent / 2, extent / 2]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthConfig {
    /// Length of one segment, i.e. the lattice spacing.
    pub step_length: f32,
    pub range_length: f32,
    pub range_width: f32,
    pub range_height: f32,
    /// Maximum number of cells sampled by one relocation search.
    pub relocation_attempts: u32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            step_length: 2.0,
            range_length: 20.0,
            range_width: 20.0,
            range_height: 20.0,
            relocation_attempts: 100,
        }
    }
}

impl GrowthConfig {
    /// Full box size as `(length, width, height)`.
    pub fn extents(&self) -> Vec3 {
        Vec3::new(self.range_length, self.range_width, self.range_height)
    }

    /// Checks that the configuration describes a usable lattice.
    ///
    /// NaN and infinities are rejected together with non-positive values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.step_length) {
            return Err(ConfigError::NonPositiveStep(self.step_length));
        }

        let axes = [
            ("length", self.range_length),
            ("width", self.range_width),
            ("height", self.range_height),
        ];
        for (axis, value) in axes {
            if !is_positive(value) {
                return Err(ConfigError::NonPositiveExtent { axis, value });
            }
        }

        if self.relocation_attempts == 0 {
            return Err(ConfigError::ZeroAttemptBudget);
        }
        Ok(())
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

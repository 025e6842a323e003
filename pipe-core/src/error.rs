//! Error types for configuration and growth.

use thiserror::Error;

/// A [`GrowthConfig`](crate::config::GrowthConfig) that cannot describe a
/// usable lattice. Raised before any session state exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Step length is zero, negative, or not finite.
    #[error("step length must be positive and finite, got {0}")]
    NonPositiveStep(f32),

    /// One of the bounding box extents is zero, negative, or not finite.
    #[error("{axis} extent must be positive and finite, got {value}")]
    NonPositiveExtent { axis: &'static str, value: f32 },

    /// The relocation search would never draw a sample.
    #[error("relocation attempt budget must be at least 1")]
    ZeroAttemptBudget,
}

/// Errors surfaced by [`GrowthEngine::tick`](crate::engine::GrowthEngine::tick).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrowthError {
    /// The path is stuck and no free cell was found within the attempt
    /// budget. Growth for this session cannot continue until the host
    /// intervenes (for example with
    /// [`GrowthEngine::reset`](crate::engine::GrowthEngine::reset)).
    #[error("no free cell found after {attempts} relocation attempts ({occupied} cells occupied)")]
    RelocationExhausted { attempts: u32, occupied: usize },
}

//! Bounded search for a fresh start cell once the tip is stuck.

use glam::IVec3;
use rand::Rng;
use tracing::trace;

use crate::{error::GrowthError, lattice::Lattice, occupancy::Occupancy, types::Cell};

/// A successful relocation search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// The free cell that was found.
    pub cell: Cell,
    /// Number of cells sampled, including the accepted one.
    pub attempts: u32,
}

/// Samples in-bounds cells uniformly until one is unoccupied.
///
/// Each axis index is drawn independently from `[-max, max]` for that
/// axis (see [`Lattice::max_cell`]), which is the lattice version of a
/// uniform draw over `[-extent/2, extent/2]`.
///
/// ### Parameters
/// - `rng` - Source of randomness.
/// - `occupancy` - Cells that may not be chosen; only read.
/// - `lattice` - Lattice whose in-bounds cells are sampled.
/// - `budget` - Maximum number of cells to sample.
///
/// ### Returns
/// - `Ok(Relocation)` with the first free cell drawn.
/// - `Err(GrowthError::RelocationExhausted)` if `budget` samples were
///   all occupied. No more than `budget` samples are ever drawn.
pub fn find_fresh_cell<R: Rng + ?Sized>(
    rng: &mut R,
    occupancy: &Occupancy,
    lattice: &Lattice,
    budget: u32,
) -> Result<Relocation, GrowthError> {
    let max = lattice.max_cell();
    for attempt in 1..=budget {
        let cell = IVec3::new(
            rng.random_range(-max.x..=max.x),
            rng.random_range(-max.y..=max.y),
            rng.random_range(-max.z..=max.z),
        );
        if !occupancy.contains(cell) {
            return Ok(Relocation {
                cell,
                attempts: attempt,
            });
        }
        trace!(?cell, attempt, "relocation candidate occupied");
    }

    Err(GrowthError::RelocationExhausted {
        attempts: budget,
        occupied: occupancy.len(),
    })
}

//! Randomized choice of the next growth direction.
//!
//! The six directions are shuffled uniformly *before* filtering, and the
//! first free one wins. That makes the result uniform over whichever
//! directions happen to be free, with no preference for going straight.

use rand::{Rng, seq::SliceRandom};

use crate::{
    lattice::{Direction, Lattice},
    occupancy::Occupancy,
    types::Cell,
};

/// Picks the direction in which the tip grows next.
///
/// Implementations must only return a direction whose neighbour cell is
/// in bounds and unoccupied (see [`is_open`]). `None` means the tip is
/// stalled and the engine will relocate.
pub trait DirectionSampler {
    fn sample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        from: Cell,
        occupancy: &Occupancy,
        lattice: &Lattice,
    ) -> Option<Direction>;
}

/// Default sampler: uniform shuffle of all six directions, then the
/// first open one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shuffled;

impl DirectionSampler for Shuffled {
    fn sample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        from: Cell,
        occupancy: &Occupancy,
        lattice: &Lattice,
    ) -> Option<Direction> {
        let mut dirs = Direction::ALL;
        dirs.shuffle(rng);
        dirs.into_iter()
            .find(|&d| is_open(from, d, occupancy, lattice))
    }
}

/// `true` iff stepping from `from` along `dir` lands on an in-bounds,
/// unoccupied cell.
#[inline]
pub fn is_open(from: Cell, dir: Direction, occupancy: &Occupancy, lattice: &Lattice) -> bool {
    let next = lattice.neighbour(from, dir);
    lattice.in_bounds(next) && !occupancy.contains(next)
}

/// All open directions from `from`, in [`Direction::ALL`] order.
pub fn open_directions<'a>(
    from: Cell,
    occupancy: &'a Occupancy,
    lattice: &'a Lattice,
) -> impl Iterator<Item = Direction> + 'a {
    Direction::ALL
        .into_iter()
        .filter(move |&d| is_open(from, d, occupancy, lattice))
}

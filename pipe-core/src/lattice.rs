//! Lattice geometry: the six axis directions, the bounding box, and
//! conversion between lattice cells and world positions.
//!
//! Everything here is pure arithmetic with no failure modes.

use glam::{IVec3, Vec3};
use rand::Rng;

use crate::{config::GrowthConfig, types::Cell};

/// One of the six axis-aligned growth directions.
///
/// The mapping to axes is: `Right`/`Left` = ±x, `Up`/`Down` = ±y,
/// `Forward`/`Back` = ±z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Forward,
        Direction::Back,
    ];

    /// Unit cell offset of this direction. Never zero.
    pub const fn offset(self) -> IVec3 {
        match self {
            Direction::Up => IVec3::Y,
            Direction::Down => IVec3::NEG_Y,
            Direction::Left => IVec3::NEG_X,
            Direction::Right => IVec3::X,
            Direction::Forward => IVec3::Z,
            Direction::Back => IVec3::NEG_Z,
        }
    }

    /// Unit world-space vector of this direction.
    pub fn unit(self) -> Vec3 {
        self.offset().as_vec3()
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Forward => Direction::Back,
            Direction::Back => Direction::Forward,
        }
    }

    /// Uniformly random direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        Direction::ALL[rng.random_range(0..Direction::ALL.len())]
    }
}

/// Axis-aligned box centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Full size along x, y, z.
    pub extent: Vec3,
}

impl BoundingBox {
    pub fn new(length: f32, width: f32, height: f32) -> Self {
        Self {
            extent: Vec3::new(length, width, height),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.extent * 0.5
    }

    /// `true` iff every coordinate of `p` lies in `[-extent/2, extent/2]`
    /// (inclusive) for its axis.
    pub fn contains(&self, p: Vec3) -> bool {
        let h = self.half_extents();
        p.cmpge(-h).all() && p.cmple(h).all()
    }
}

/// The lattice of a growth session: spacing plus bounding box.
///
/// The in-bounds cells form the index box `[-max_cell, max_cell]` on
/// each axis, which is exactly the set of cells whose world position
/// passes [`BoundingBox::contains`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lattice {
    step: f32,
    bounds: BoundingBox,
    max_cell: IVec3,
}

impl Lattice {
    /// Builds a lattice. `step` and all extents must be positive; use
    /// [`GrowthConfig::validate`] first when they come from user input.
    pub fn new(step: f32, bounds: BoundingBox) -> Self {
        let h = bounds.half_extents();
        let max_cell = IVec3::new(
            max_index(h.x, step),
            max_index(h.y, step),
            max_index(h.z, step),
        );
        Self {
            step,
            bounds,
            max_cell,
        }
    }

    pub fn from_config(cfg: &GrowthConfig) -> Self {
        Self::new(
            cfg.step_length,
            BoundingBox::new(cfg.range_length, cfg.range_width, cfg.range_height),
        )
    }

    pub fn step_length(&self) -> f32 {
        self.step
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Largest in-bounds index on each axis.
    pub fn max_cell(&self) -> IVec3 {
        self.max_cell
    }

    /// Number of in-bounds cells.
    pub fn cell_count(&self) -> u64 {
        let span = |k: i32| 2 * k as u64 + 1;
        span(self.max_cell.x)
            .saturating_mul(span(self.max_cell.y))
            .saturating_mul(span(self.max_cell.z))
    }

    pub fn to_world(&self, cell: Cell) -> Vec3 {
        cell.as_vec3() * self.step
    }

    /// Nearest lattice cell to a world position.
    pub fn snap(&self, p: Vec3) -> Cell {
        (p / self.step).round().as_ivec3()
    }

    /// Cell one step from `cell` along `dir`.
    #[inline]
    pub fn neighbour(&self, cell: Cell, dir: Direction) -> Cell {
        cell + dir.offset()
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.abs().cmple(self.max_cell).all()
    }
}

/// Largest `k` with `k * step <= half`, computed with the same f32
/// product that [`Lattice::to_world`] uses.
fn max_index(half: f32, step: f32) -> i32 {
    let mut k = (half / step).floor() as i32;
    while k > 0 && k as f32 * step > half {
        k -= 1;
    }
    while k < i32::MAX && (k + 1) as f32 * step <= half {
        k += 1;
    }
    k
}

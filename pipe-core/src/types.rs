use glam::IVec3;
use rand::Rng;

/// Integer index of a lattice point.
///
/// The world position of a cell is `cell * step_length`, see
/// [`crate::lattice::Lattice::to_world`]. Two cells are the same point
/// iff their indices are equal, so no float tolerance is involved.
pub type Cell = IVec3;

/// Opaque colour shared by every segment of one run of pipe.
///
/// Channels are in `[0, 1)`. The core never looks at the value; it only
/// hands it to the segment sink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTag {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorTag {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            r: rng.random(),
            g: rng.random(),
            b: rng.random(),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

use std::collections::HashSet;

use crate::types::Cell;

/// Cells already filled by pipe.
///
/// Append-only for the life of a growth session: there is no removal.
/// Memory grows with the path length, in exchange for O(1) average
/// collision checks.
#[derive(Debug, Default, Clone)]
pub struct Occupancy {
    cells: HashSet<Cell>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Marks `cell` as filled. Returns `false` if it already was, in
    /// which case nothing changes.
    pub fn insert(&mut self, cell: Cell) -> bool {
        self.cells.insert(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    #[test]
    fn new_set_is_empty() {
        let occ = Occupancy::new();
        assert!(occ.is_empty());
        assert_eq!(occ.len(), 0);
        assert!(!occ.contains(IVec3::ZERO));
    }

    #[test]
    fn insert_then_contains() {
        let mut occ = Occupancy::new();
        assert!(occ.insert(IVec3::new(1, 2, 3)));
        assert!(occ.contains(IVec3::new(1, 2, 3)));
        assert!(!occ.contains(IVec3::new(3, 2, 1)));
        assert_eq!(occ.len(), 1);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut occ = Occupancy::new();
        occ.insert(IVec3::ZERO);
        occ.insert(IVec3::X);

        assert!(!occ.insert(IVec3::ZERO));
        assert_eq!(occ.len(), 2);
    }

    #[test]
    fn iter_yields_every_cell_once() {
        let mut occ = Occupancy::new();
        for c in [IVec3::ZERO, IVec3::X, IVec3::Y, IVec3::X] {
            occ.insert(c);
        }
        let mut cells: Vec<_> = occ.iter().map(|c| c.to_array()).collect();
        cells.sort();
        assert_eq!(cells, vec![[0, 0, 0], [0, 1, 0], [1, 0, 0]]);
    }
}

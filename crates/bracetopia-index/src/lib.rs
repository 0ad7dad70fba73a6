//! Neighborhood indexing for square, row-major cell grids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cells in a Moore neighborhood.
pub const MOORE_NEIGHBORS: usize = 8;

/// Errors emitted by neighborhood index implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., a zero side length).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Compass direction of a Moore neighbor.
///
/// Variants are declared in sampling order: the row above left to right, the
/// two row neighbors, then the row below left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Compass {
    /// All directions in sampling order.
    pub const ALL: [Compass; MOORE_NEIGHBORS] = [
        Compass::NorthWest,
        Compass::North,
        Compass::NorthEast,
        Compass::West,
        Compass::East,
        Compass::SouthWest,
        Compass::South,
        Compass::SouthEast,
    ];

    /// Row and column delta of this direction.
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Compass::NorthWest => (-1, -1),
            Compass::North => (-1, 0),
            Compass::NorthEast => (-1, 1),
            Compass::West => (0, -1),
            Compass::East => (0, 1),
            Compass::SouthWest => (1, -1),
            Compass::South => (1, 0),
            Compass::SouthEast => (1, 1),
        }
    }
}

/// Common behaviour exposed by neighborhood indices.
pub trait NeighborhoodIndex {
    /// Flat index of the neighbor of `idx` in `direction`, or `None` when it falls off the grid.
    fn neighbor(&self, idx: usize, direction: Compass) -> Option<usize>;

    /// Neighbors of `idx` in [`Compass::ALL`] order.
    fn neighbors_of(&self, idx: usize) -> [Option<usize>; MOORE_NEIGHBORS] {
        Compass::ALL.map(|direction| self.neighbor(idx, direction))
    }
}

/// Bounded (non-wrapping) Moore neighborhood over a `side * side` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MooreIndex {
    side: usize,
}

impl MooreIndex {
    /// Create an index for a square grid with the provided side length.
    pub fn new(side: usize) -> Result<Self, IndexError> {
        if side == 0 {
            return Err(IndexError::InvalidConfig("side length must be positive"));
        }
        if side.checked_mul(side).is_none() {
            return Err(IndexError::InvalidConfig("side length overflows cell count"));
        }
        Ok(Self { side })
    }

    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.side * self.side
    }

    /// Flat row-major offset of `(row, col)`, if it lies on the grid.
    #[must_use]
    pub fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.side && col < self.side).then(|| row * self.side + col)
    }

    /// Inverse of [`MooreIndex::offset`].
    #[must_use]
    pub fn coordinates(&self, idx: usize) -> Option<(usize, usize)> {
        (idx < self.cell_count()).then(|| (idx / self.side, idx % self.side))
    }
}

impl NeighborhoodIndex for MooreIndex {
    fn neighbor(&self, idx: usize, direction: Compass) -> Option<usize> {
        let (row, col) = self.coordinates(idx)?;
        let (d_row, d_col) = direction.offset();
        let row = row.checked_add_signed(d_row)?;
        let col = col.checked_add_signed(d_col)?;
        self.offset(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_side() {
        assert_eq!(
            MooreIndex::new(0),
            Err(IndexError::InvalidConfig("side length must be positive"))
        );
    }

    #[test]
    fn interior_cell_has_all_neighbors_in_compass_order() {
        let index = MooreIndex::new(5).expect("index");
        let center = index.offset(2, 2).expect("center");
        assert_eq!(
            index.neighbors_of(center),
            [
                Some(6),
                Some(7),
                Some(8),
                Some(11),
                Some(13),
                Some(16),
                Some(17),
                Some(18)
            ]
        );
    }

    #[test]
    fn corner_cell_is_clipped() {
        let index = MooreIndex::new(5).expect("index");
        let neighbors = index.neighbors_of(0);
        assert_eq!(neighbors.iter().flatten().count(), 3);
        assert_eq!(index.neighbor(0, Compass::East), Some(1));
        assert_eq!(index.neighbor(0, Compass::South), Some(5));
        assert_eq!(index.neighbor(0, Compass::SouthEast), Some(6));
        assert_eq!(index.neighbor(0, Compass::NorthWest), None);
    }

    #[test]
    fn right_edge_does_not_wrap_to_next_row() {
        let index = MooreIndex::new(5).expect("index");
        assert_eq!(index.neighbor(4, Compass::East), None);
        assert_eq!(index.neighbor(5, Compass::West), None);
        assert_eq!(index.neighbor(24, Compass::SouthEast), None);
    }

    #[test]
    fn single_cell_grid_has_no_neighbors() {
        let index = MooreIndex::new(1).expect("index");
        assert!(index.neighbors_of(0).iter().all(Option::is_none));
        assert_eq!(index.coordinates(1), None);
    }
}

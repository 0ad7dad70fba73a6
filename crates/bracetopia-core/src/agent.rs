//! Neighborhood sampling and happiness scoring for individual agents.

use bracetopia_index::{Compass, MOORE_NEIGHBORS, NeighborhoodIndex};

use crate::grid::{Cell, Grid};

/// The eight Moore neighbors of a cell in [`Compass::ALL`] order.
///
/// `None` marks a neighbor position that lies off the grid, which is distinct
/// from a `Some(Cell::Vacant)` neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    slots: [Option<Cell>; MOORE_NEIGHBORS],
}

impl Neighborhood {
    /// Sample the neighbors of `(row, col)` from `grid`.
    ///
    /// A position outside the grid has no neighbors at all.
    #[must_use]
    pub fn sample(grid: &Grid, row: usize, col: usize) -> Self {
        match grid.index().offset(row, col) {
            Some(idx) => Self::sample_at(grid, idx),
            None => Self::from_slots([None; MOORE_NEIGHBORS]),
        }
    }

    /// Sample the neighbors of the flat position `idx`.
    #[must_use]
    pub fn sample_at(grid: &Grid, idx: usize) -> Self {
        let slots = grid
            .index()
            .neighbors_of(idx)
            .map(|neighbor| neighbor.and_then(|n| grid.cell_at(n)));
        Self { slots }
    }

    #[must_use]
    pub const fn from_slots(slots: [Option<Cell>; MOORE_NEIGHBORS]) -> Self {
        Self { slots }
    }

    #[must_use]
    pub const fn slots(&self) -> &[Option<Cell>; MOORE_NEIGHBORS] {
        &self.slots
    }

    /// Neighbor in `direction`, `None` when off the grid.
    #[must_use]
    pub fn get(&self, direction: Compass) -> Option<Cell> {
        Compass::ALL
            .iter()
            .position(|candidate| *candidate == direction)
            .and_then(|slot| self.slots[slot])
    }

    /// Neighbors that lie on the grid, vacant ones included.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Neighbors holding exactly `cell`.
    #[must_use]
    pub fn like_count(&self, cell: Cell) -> usize {
        self.slots.iter().filter(|slot| **slot == Some(cell)).count()
    }
}

/// Fraction of on-grid neighbors sharing `cell`'s preference.
///
/// Vacant neighbors count as valid but never as alike, so they dilute
/// happiness. Vacant cells and cells without on-grid neighbors score 0.
#[must_use]
pub fn happiness(cell: Cell, neighborhood: &Neighborhood) -> f64 {
    if !cell.is_agent() {
        return 0.0;
    }
    let valid = neighborhood.valid_count();
    if valid == 0 {
        return 0.0;
    }
    neighborhood.like_count(cell) as f64 / valid as f64
}

/// Happiness of whatever occupies flat position `idx` of `grid`.
#[must_use]
pub fn happiness_at(grid: &Grid, idx: usize) -> f64 {
    grid.cell_at(idx)
        .map_or(0.0, |cell| happiness(cell, &Neighborhood::sample_at(grid, idx)))
}

/// Mean happiness over all agents of `grid`; 0.0 when the grid holds no agents.
#[must_use]
pub fn team_happiness(grid: &Grid) -> f64 {
    let (total, agents) = grid
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_agent())
        .fold((0.0_f64, 0usize), |(total, agents), (idx, _)| {
            (total + happiness_at(grid, idx), agents + 1)
        });
    if agents == 0 {
        0.0
    } else {
        total / agents as f64
    }
}

//! Cell and grid model plus the randomized grid initializer.

use std::fmt;

use bracetopia_index::{IndexError, MooreIndex};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contents of a single grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Vacant,
    /// Agent preferring braces at the end of the line.
    Endline,
    /// Agent preferring braces on their own line.
    Newline,
}

impl Cell {
    /// Single-character symbol used by the text renderers.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Cell::Vacant => '.',
            Cell::Endline => 'e',
            Cell::Newline => 'n',
        }
    }

    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Cell::Vacant),
            'e' => Some(Cell::Endline),
            'n' => Some(Cell::Newline),
            _ => None,
        }
    }

    /// Whether the cell holds an agent.
    #[must_use]
    pub const fn is_agent(self) -> bool {
        !matches!(self, Cell::Vacant)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Errors raised while building grids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("expected {expected} cells for the grid side, found {actual}")]
    CellCount { expected: usize, actual: usize },
    #[error("unrecognized cell symbol {0:?}")]
    UnknownSymbol(char),
}

/// Per-value cell counts of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Census {
    pub vacant: usize,
    pub endline: usize,
    pub newline: usize,
}

impl Census {
    /// Counts produced by the initializer for the given side and percentages.
    ///
    /// Vacancies are taken from the whole grid, endline agents from the
    /// remaining positions, and newline agents fill the rest. Both divisions
    /// truncate.
    #[must_use]
    pub fn planned(side: usize, vacancy_percent: u8, endline_percent: u8) -> Self {
        let total = side * side;
        let vacant = total * usize::from(vacancy_percent) / 100;
        let endline = usize::from(endline_percent) * (total - vacant) / 100;
        Self {
            vacant,
            endline,
            newline: total - vacant - endline,
        }
    }

    #[must_use]
    pub fn of(cells: &[Cell]) -> Self {
        cells.iter().fold(Self::default(), |mut census, cell| {
            match cell {
                Cell::Vacant => census.vacant += 1,
                Cell::Endline => census.endline += 1,
                Cell::Newline => census.newline += 1,
            }
            census
        })
    }

    /// Number of agents (non-vacant cells).
    #[must_use]
    pub const fn occupied(&self) -> usize {
        self.endline + self.newline
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.vacant + self.occupied()
    }
}

/// Square grid of cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    index: MooreIndex,
    cells: Vec<Cell>,
}

impl Grid {
    /// Wrap an existing row-major cell buffer.
    pub fn from_cells(side: usize, cells: Vec<Cell>) -> Result<Self, GridError> {
        let index = MooreIndex::new(side)?;
        if cells.len() != index.cell_count() {
            return Err(GridError::CellCount {
                expected: index.cell_count(),
                actual: cells.len(),
            });
        }
        Ok(Self { index, cells })
    }

    /// Parse a grid from one text line per row of cell symbols; whitespace is ignored.
    ///
    /// ```
    /// use bracetopia_core::{Cell, Grid};
    ///
    /// let grid = Grid::parse("e .\nn e").unwrap();
    /// assert_eq!(grid.side(), 2);
    /// assert_eq!(grid.get(1, 0), Some(Cell::Newline));
    /// ```
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut cells = Vec::new();
        let mut rows = 0usize;
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            rows += 1;
            for symbol in line.chars().filter(|ch| !ch.is_whitespace()) {
                cells.push(Cell::from_symbol(symbol).ok_or(GridError::UnknownSymbol(symbol))?);
            }
        }
        Self::from_cells(rows, cells)
    }

    /// Build the initial grid: lay out the planned counts contiguously
    /// (endline, vacant, newline) and shuffle them with `rng`.
    pub fn populate(
        side: usize,
        vacancy_percent: u8,
        endline_percent: u8,
        rng: &mut dyn RngCore,
    ) -> Result<Self, GridError> {
        let plan = Census::planned(side, vacancy_percent, endline_percent);
        let mut cells = Vec::with_capacity(plan.total());
        cells.extend(std::iter::repeat_n(Cell::Endline, plan.endline));
        cells.extend(std::iter::repeat_n(Cell::Vacant, plan.vacant));
        cells.extend(std::iter::repeat_n(Cell::Newline, plan.newline));
        shuffle(&mut cells, rng);
        Self::from_cells(side, cells)
    }

    #[must_use]
    pub const fn side(&self) -> usize {
        self.index.side()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub const fn index(&self) -> &MooreIndex {
        &self.index
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `(row, col)`, or `None` off the grid.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.index
            .offset(row, col)
            .and_then(|idx| self.cell_at(idx))
    }

    /// Cell at a flat row-major position.
    #[must_use]
    pub fn cell_at(&self, idx: usize) -> Option<Cell> {
        self.cells.get(idx).copied()
    }

    /// Iterate over rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.side())
    }

    #[must_use]
    pub fn census(&self) -> Census {
        Census::of(&self.cells)
    }

    pub(crate) fn set(&mut self, idx: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = cell;
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_idx, row) in self.rows().enumerate() {
            if row_idx > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{cell} ")?;
            }
        }
        Ok(())
    }
}

/// Forward Fisher-Yates over the full range.
fn shuffle(cells: &mut [Cell], rng: &mut dyn RngCore) {
    let len = cells.len();
    for i in 0..len.saturating_sub(1) {
        let j = rng.random_range(i..len);
        cells.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn planned_counts_truncate() {
        let plan = Census::planned(5, 20, 60);
        assert_eq!(plan.vacant, 5);
        assert_eq!(plan.endline, 12);
        assert_eq!(plan.newline, 8);

        let plan = Census::planned(15, 20, 60);
        assert_eq!(plan.vacant, 45);
        assert_eq!(plan.endline, 108);
        assert_eq!(plan.newline, 72);

        let plan = Census::planned(7, 33, 50);
        assert_eq!(plan.vacant, 16);
        assert_eq!(plan.endline, 16);
        assert_eq!(plan.newline, 17);
    }

    #[test]
    fn populate_preserves_planned_census() {
        let mut rng = SmallRng::seed_from_u64(41);
        let grid = Grid::populate(9, 30, 45, &mut rng).expect("grid");
        assert_eq!(grid.len(), 81);
        assert_eq!(grid.census(), Census::planned(9, 30, 45));
    }

    #[test]
    fn populate_actually_shuffles() {
        let mut rng = SmallRng::seed_from_u64(41);
        let grid = Grid::populate(15, 20, 60, &mut rng).expect("grid");
        let plan = Census::planned(15, 20, 60);
        let unshuffled_prefix = grid.cells()[..plan.endline]
            .iter()
            .all(|cell| *cell == Cell::Endline);
        assert!(!unshuffled_prefix, "endline block should be permuted");
    }

    #[test]
    fn parse_round_trips_display() {
        let grid = Grid::parse("e . n\nn n e\n. . e").expect("grid");
        assert_eq!(grid.side(), 3);
        assert_eq!(grid.get(0, 1), Some(Cell::Vacant));
        assert_eq!(grid.get(2, 2), Some(Cell::Endline));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.to_string(), "e . n \nn n e \n. . e ");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            Grid::parse("e x\nn e"),
            Err(GridError::UnknownSymbol('x'))
        );
        assert_eq!(
            Grid::parse("e e e\nn e"),
            Err(GridError::CellCount {
                expected: 4,
                actual: 5
            })
        );
        assert!(matches!(Grid::parse(""), Err(GridError::Index(_))));
    }
}

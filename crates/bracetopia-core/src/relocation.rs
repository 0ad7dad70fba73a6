//! One-cycle relocation of unhappy agents into vacancies.

use serde::{Deserialize, Serialize};

use crate::agent::happiness_at;
use crate::grid::{Cell, Grid};

/// Outcome of a single relocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relocation {
    /// Agents moved during the pass.
    pub moves: usize,
    /// Whether the pass stopped early because no vacancy was left ahead of the cursor.
    pub vacancies_exhausted: bool,
}

/// Run one relocation pass over `grid` with a happiness threshold of
/// `strength_percent / 100`.
///
/// Happiness is evaluated against a snapshot taken before any agent moves, so
/// moves within a pass never influence each other. Agents strictly below the
/// threshold move, in row-major order, into the next vacancy of the snapshot
/// at or after a cursor that only moves forward. Once the cursor runs past the
/// end of the grid the pass stops; it never wraps around.
pub fn relocate(grid: &mut Grid, strength_percent: u8) -> Relocation {
    let snapshot = grid.clone();
    let threshold = f64::from(strength_percent) / 100.0;
    let total = snapshot.len();
    let mut next_vacant = 0usize;
    let mut result = Relocation::default();

    for (idx, &cell) in snapshot.cells().iter().enumerate() {
        if next_vacant >= total {
            result.vacancies_exhausted = true;
            break;
        }
        if !cell.is_agent() || happiness_at(&snapshot, idx) >= threshold {
            continue;
        }
        // Skip positions already rewritten earlier in this pass.
        if grid.cell_at(idx) != Some(cell) {
            continue;
        }

        let Some(target) = snapshot.cells()[next_vacant..]
            .iter()
            .position(|candidate| *candidate == Cell::Vacant)
            .map(|offset| next_vacant + offset)
        else {
            next_vacant = total;
            result.vacancies_exhausted = true;
            break;
        };

        grid.set(idx, Cell::Vacant);
        grid.set(target, cell);
        next_vacant = target + 1;
        result.moves += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_unhappy_agent_takes_the_only_vacancy() {
        // The newline agent at (0,0) has no like neighbors; every endline
        // agent has at least half of its neighbors alike.
        let mut grid = Grid::parse(
            "n e e e e
             e e e e e
             e e e e e
             e e e e e
             e e e e .",
        )
        .expect("grid");
        let census = grid.census();

        let result = relocate(&mut grid, 50);

        assert_eq!(result.moves, 1);
        assert_eq!(grid.get(0, 0), Some(Cell::Vacant));
        assert_eq!(grid.get(4, 4), Some(Cell::Newline));
        assert_eq!(grid.census(), census);
    }

    #[test]
    fn happy_grid_is_left_untouched() {
        let mut grid = Grid::parse(
            "e e . n n
             e e . n n
             e e . n n
             e e . n n
             e e . n n",
        )
        .expect("grid");
        let before = grid.clone();

        let result = relocate(&mut grid, 50);

        assert_eq!(result, Relocation::default());
        assert_eq!(grid, before);
    }

    #[test]
    fn threshold_equality_counts_as_happy() {
        // The middle-row edge agents sit at exactly 3/5 happiness.
        let mut grid = Grid::parse("e e e\ne e e\n. . .").expect("grid");
        let result = relocate(&mut grid, 60);
        assert_eq!(result, Relocation::default());

        let mut grid = Grid::parse("e e e\ne e e\n. . .").expect("grid");
        let result = relocate(&mut grid, 61);
        assert_eq!(result.moves, 2);
        assert_eq!(grid.to_string(), "e e e \n. e . \ne e . ");
    }

    #[test]
    fn without_vacancies_nobody_moves() {
        let mut grid = Grid::parse("e n e\nn e n\ne n e").expect("grid");
        let before = grid.clone();
        let result = relocate(&mut grid, 99);
        assert_eq!(result.moves, 0);
        assert!(result.vacancies_exhausted);
        assert_eq!(grid, before);
    }

    #[test]
    fn cursor_only_moves_forward() {
        // Agents at 0 and 2 are unhappy; the only vacancy sits at index 1.
        // The first mover takes it, the second finds nothing ahead.
        let mut grid = Grid::parse("e . n\nn n n\nn n n").expect("grid");
        let result = relocate(&mut grid, 99);

        assert_eq!(result.moves, 1);
        assert!(result.vacancies_exhausted);
        assert_eq!(grid.cells()[0], Cell::Vacant);
        assert_eq!(grid.cells()[1], Cell::Endline);
    }

    #[test]
    fn agents_move_into_vacancies_in_scan_order() {
        let mut grid = Grid::parse(
            "e n e
             . n .
             n e n",
        )
        .expect("grid");
        let result = relocate(&mut grid, 99);

        // Index 0 (e) moves to 3; index 1 (n) moves to 5; nothing is left for later agents.
        assert_eq!(result.moves, 2);
        assert_eq!(grid.to_string(), ". . e \ne n n \nn e n ");
    }

    #[test]
    fn happiness_uses_the_pre_move_snapshot() {
        // The endline at index 1 is happy (3/5) only while its neighbor at
        // index 0 is still in place. That neighbor moves first, yet index 1
        // is judged against the snapshot and stays.
        let mut grid = Grid::parse(
            "e e e
             n n e
             . . .",
        )
        .expect("grid");
        let result = relocate(&mut grid, 50);

        assert_eq!(result.moves, 3);
        assert!(result.vacancies_exhausted);
        assert_eq!(grid.to_string(), ". e e \n. . e \ne n n ");
        assert_eq!(grid.cell_at(1), Some(Cell::Endline));
        assert!(happiness_at(&grid, 1) < 0.5);
    }
}

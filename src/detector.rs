use rayon::prelude::*;
use tracing::debug;

use crate::grid::Grid;

/// Number of identical consecutive cells that marks a mutant.
pub const RUN_LENGTH: usize = 4;

/// Grids at least this wide are scanned row-parallel.
pub const PARALLEL_MIN_SIDE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
    DiagonalDownRight,
    DiagonalDownLeft,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagonalDownRight,
        Direction::DiagonalDownLeft,
    ];

    /// Step as (row delta, column delta).
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalDownRight => (1, 1),
            Direction::DiagonalDownLeft => (1, -1),
        }
    }
}

/// Walks `RUN_LENGTH` cells from (row, col) and checks that each one is
/// in bounds and equal to `target`.
pub fn probe(grid: &Grid, row: usize, col: usize, direction: Direction, target: char) -> bool {
    let n = grid.size() as isize;
    let (d_row, d_col) = direction.step();
    let (mut r, mut c) = (row as isize, col as isize);

    for _ in 0..RUN_LENGTH {
        if r < 0 || r >= n || c < 0 || c >= n {
            return false;
        }
        if grid.get(r as usize, c as usize) != Some(target) {
            return false;
        }
        r += d_row;
        c += d_col;
    }
    true
}

fn row_has_run(grid: &Grid, row: usize) -> bool {
    grid.row(row).iter().enumerate().any(|(col, &target)| {
        Direction::ALL
            .iter()
            .any(|&direction| probe(grid, row, col, direction, target))
    })
}

/// Returns true when the grid holds a run of `RUN_LENGTH` identical cells
/// horizontally, vertically or along either diagonal.
pub fn is_mutant(grid: &Grid) -> bool {
    let n = grid.size();
    if n < RUN_LENGTH {
        return false;
    }

    if n >= PARALLEL_MIN_SIDE {
        debug!(action = "scan", component = "detector", size = n, mode = "parallel", "Scanning grid");
        (0..n).into_par_iter().any(|row| row_has_run(grid, row))
    } else {
        (0..n).any(|row| row_has_run(grid, row))
    }
}

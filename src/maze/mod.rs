pub mod cell;
pub mod grid;

pub use cell::{CellKind, TileMark};
pub use grid::Grid;

use crate::generator;

/// A grid coordinate as (row, col), 0-indexed.
pub type Coord = (u16, u16);

/// A generated maze with its fixed start and end cells.
///
/// The grid is immutable after generation except for [`Maze::toggle`], which
/// flips individual interior cells between wall and path. Toggling can break
/// the perfect-maze property and even connectivity; searches tolerate that by
/// reporting no route.
pub struct Maze {
    grid: Grid,
}

impl Maze {
    /// Generates a fresh maze.
    ///
    /// # Panics
    /// If `rows` or `cols` is less than 5. Odd dimensions are recommended;
    /// even values shift the end cell onto the carving lattice's off-grid and
    /// may leave it unreachable.
    pub fn new(rows: u16, cols: u16, seed: Option<u64>) -> Self {
        Maze {
            grid: generator::generate(rows, cols, seed),
        }
    }

    /// Re-carves the maze in place, keeping its dimensions.
    pub fn regenerate(&mut self, seed: Option<u64>) {
        self.grid = generator::generate(self.grid.rows(), self.grid.cols(), seed);
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Copy of the grid for a search to run against, so concurrent toggling
    /// cannot touch the cells a trace was computed from.
    pub fn snapshot(&self) -> Grid {
        self.grid.clone()
    }

    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    /// The fixed start cell.
    pub fn start(&self) -> Coord {
        (1, 1)
    }

    /// The fixed end cell.
    pub fn end(&self) -> Coord {
        (self.grid.rows() - 2, self.grid.cols() - 2)
    }

    /// Flips an interior cell between wall and path.
    ///
    /// Returns the new cell kind, or `None` if the cell is on the border or
    /// holds the start or end marker, which never change.
    pub fn toggle(&mut self, coord: Coord) -> Option<CellKind> {
        if !self.grid.in_bounds(coord) || self.grid.is_boundary(coord) {
            return None;
        }
        let flipped = match self.grid[coord] {
            CellKind::Wall => CellKind::Path,
            CellKind::Path => CellKind::Wall,
            CellKind::Start | CellKind::End => return None,
        };
        self.grid[coord] = flipped;
        Some(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Flood fill over open cells from start, independent of the solvers.
    fn reachable_from_start(grid: &Grid) -> HashSet<Coord> {
        let mut seen = HashSet::from([(1, 1)]);
        let mut stack = vec![(1u16, 1u16)];
        while let Some((r, c)) = stack.pop() {
            for (nr, nc) in [
                (r, c + 1),
                (r + 1, c),
                (r, c.wrapping_sub(1)),
                (r.wrapping_sub(1), c),
            ] {
                if grid.in_bounds((nr, nc)) && grid[(nr, nc)].is_open() && seen.insert((nr, nc)) {
                    stack.push((nr, nc));
                }
            }
        }
        seen
    }

    #[test]
    fn test_border_is_walled() {
        let maze = Maze::new(21, 21, Some(7));
        let grid = maze.grid();
        for r in 0..21 {
            assert_eq!(grid[(r, 0)], CellKind::Wall);
            assert_eq!(grid[(r, 20)], CellKind::Wall);
        }
        for c in 0..21 {
            assert_eq!(grid[(0, c)], CellKind::Wall);
            assert_eq!(grid[(20, c)], CellKind::Wall);
        }
    }

    #[test]
    fn test_start_and_end_markers() {
        let maze = Maze::new(11, 15, Some(3));
        assert_eq!(maze.grid()[maze.start()], CellKind::Start);
        assert_eq!(maze.grid()[maze.end()], CellKind::End);
        assert_eq!(maze.start(), (1, 1));
        assert_eq!(maze.end(), (9, 13));
    }

    #[test]
    fn test_carved_cells_form_spanning_tree() {
        // For odd dimensions the carve visits every lattice cell, so the open
        // cells must form a single tree: all reachable from start, and exactly
        // one fewer adjacency than there are open cells.
        let maze = Maze::new(21, 21, Some(42));
        let grid = maze.grid();

        let open: Vec<Coord> = (0..21)
            .flat_map(|r| (0..21).map(move |c| (r, c)))
            .filter(|&coord| grid[coord].is_open())
            .collect();

        let reachable = reachable_from_start(grid);
        assert_eq!(reachable.len(), open.len());

        // Count each adjacency once by looking only east and south.
        let edges: usize = open
            .iter()
            .map(|&(r, c)| {
                [(r, c + 1), (r + 1, c)]
                    .into_iter()
                    .filter(|&n| grid.in_bounds(n) && grid[n].is_open())
                    .count()
            })
            .sum();
        assert_eq!(edges, open.len() - 1);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = Maze::new(15, 15, Some(9)).grid().codes();
        let b = Maze::new(15, 15, Some(9)).grid().codes();
        assert_eq!(a, b);
        let c = Maze::new(15, 15, Some(10)).grid().codes();
        assert_ne!(a, c);
    }

    #[test]
    fn test_even_dimensions_leave_end_off_lattice() {
        // With even dimensions the end corner sits on coordinates the carve
        // never reaches, so forcing the End marker strands it behind walls.
        let maze = Maze::new(6, 6, Some(1));
        assert_eq!(maze.grid()[maze.end()], CellKind::End);
        assert!(!reachable_from_start(maze.grid()).contains(&maze.end()));
    }

    #[test]
    fn test_toggle_flips_interior_cells_only() {
        let mut maze = Maze::new(9, 9, Some(5));
        assert_eq!(maze.toggle((0, 4)), None);
        assert_eq!(maze.toggle((8, 4)), None);
        assert_eq!(maze.toggle(maze.start()), None);
        assert_eq!(maze.toggle(maze.end()), None);
        assert_eq!(maze.toggle((9, 9)), None);

        let before = maze.grid()[(4, 4)];
        let after = maze.toggle((4, 4)).unwrap();
        assert_ne!(before, after);
        assert_eq!(maze.grid()[(4, 4)], after);
        assert_eq!(maze.toggle((4, 4)).unwrap(), before);
    }

    #[test]
    fn test_regenerate_replaces_the_carving() {
        let mut maze = Maze::new(15, 15, Some(2));
        let before = maze.grid().codes();
        maze.regenerate(Some(3));
        assert_ne!(before, maze.grid().codes());
        assert_eq!(maze.grid()[maze.start()], CellKind::Start);
        assert_eq!(maze.grid()[maze.end()], CellKind::End);
    }
}

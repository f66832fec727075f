use std::collections::HashMap;

mod bfs;
mod dfs;
mod wavefront;

use crate::maze::{Coord, Grid};
use bfs::solve_bfs;
use dfs::solve_dfs;
use wavefront::solve_wavefront;

/// Neighbor order for expansion: East, South, West, North. BFS and wavefront
/// keep this order fixed, which pins the tie-break among equally short routes;
/// DFS reshuffles it on every expansion.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// One exploration event in a search trace.
///
/// BFS and DFS reveal a single cell per event, in strict dequeue/pop order.
/// Wavefront reveals a whole layer of same-distance cells at once. Replay
/// advances one event per tick either way, so the variant decides how much of
/// the grid lights up per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Cell(Coord),
    Layer(Vec<Coord>),
}

impl TraceEvent {
    /// The cells this event reveals.
    pub fn cells(&self) -> &[Coord] {
        match self {
            TraceEvent::Cell(cell) => std::slice::from_ref(cell),
            TraceEvent::Layer(cells) => cells,
        }
    }
}

/// What a search produced: the full exploration record and the route, empty
/// when no route exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub trace: Vec<TraceEvent>,
    pub path: Vec<Coord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Bfs,
    Dfs,
    Wavefront,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Bfs => write!(f, "Breadth-First Search (BFS)"),
            Strategy::Dfs => write!(f, "Depth-First Search (DFS)"),
            Strategy::Wavefront => write!(f, "Quantum Wavefront Search"),
        }
    }
}

/// Runs the chosen strategy over the grid. Any non-wall cell is traversable.
/// `seed` only affects DFS, whose neighbor shuffling is otherwise drawn from
/// the OS.
///
/// # Panics
/// If `start` or `end` is out of bounds or a wall cell.
pub fn search(
    grid: &Grid,
    start: Coord,
    end: Coord,
    strategy: Strategy,
    seed: Option<u64>,
) -> SearchOutcome {
    ensure_endpoint(grid, "start", start);
    ensure_endpoint(grid, "end", end);
    match strategy {
        Strategy::Bfs => solve_bfs(grid, start, end),
        Strategy::Dfs => solve_dfs(grid, start, end, seed),
        Strategy::Wavefront => solve_wavefront(grid, start, end),
    }
}

fn ensure_endpoint(grid: &Grid, name: &str, coord: Coord) {
    assert!(
        grid.in_bounds(coord),
        "{} {:?} is outside the {}x{} grid",
        name,
        coord,
        grid.rows(),
        grid.cols()
    );
    assert!(grid[coord].is_open(), "{} {:?} is a wall cell", name, coord);
}

/// Moves one step from `coord`, or `None` when that leaves the grid.
fn step(grid: &Grid, (r, c): Coord, (dr, dc): (i32, i32)) -> Option<Coord> {
    let nr = r as i32 + dr;
    let nc = c as i32 + dc;
    if nr < 0 || nc < 0 {
        return None;
    }
    let coord = (nr as u16, nc as u16);
    grid.in_bounds(coord).then_some(coord)
}

/// Walks the parent map back from `end` and reverses. The start cell has no
/// parent entry, so the walk terminates there.
fn backtrack(parent: &HashMap<Coord, Coord>, end: Coord) -> Vec<Coord> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&previous) = parent.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::maze::{CellKind, Coord, Grid};
    use std::collections::HashSet;

    /// A bordered grid with every interior cell open.
    pub(crate) fn open_grid(rows: u16, cols: u16) -> Grid {
        let mut grid = Grid::new(rows, cols, CellKind::Wall);
        for r in 1..rows - 1 {
            for c in 1..cols - 1 {
                grid[(r, c)] = CellKind::Path;
            }
        }
        grid[(1, 1)] = CellKind::Start;
        grid[(rows - 2, cols - 2)] = CellKind::End;
        grid
    }

    /// An open grid whose start cell is walled in on all four sides.
    pub(crate) fn sealed_start_grid(rows: u16, cols: u16) -> Grid {
        let mut grid = open_grid(rows, cols);
        grid[(1, 2)] = CellKind::Wall;
        grid[(2, 1)] = CellKind::Wall;
        grid
    }

    /// An open grid whose end cell is walled in on all four sides.
    pub(crate) fn sealed_end_grid(rows: u16, cols: u16) -> Grid {
        let mut grid = open_grid(rows, cols);
        grid[(rows - 2, cols - 3)] = CellKind::Wall;
        grid[(rows - 3, cols - 2)] = CellKind::Wall;
        grid
    }

    pub(crate) fn assert_contiguous(path: &[Coord]) {
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dist = a.0.abs_diff(b.0) + a.1.abs_diff(b.1);
            assert_eq!(dist, 1, "non-adjacent path cells {:?} and {:?}", a, b);
        }
    }

    /// Open cells reachable from `from`, by plain flood fill.
    pub(crate) fn reachable(grid: &Grid, from: Coord) -> HashSet<Coord> {
        let mut seen = HashSet::from([from]);
        let mut stack = vec![from];
        while let Some(cell) = stack.pop() {
            for dir in super::DIRECTIONS {
                if let Some(neighbor) = super::step(grid, cell, dir)
                    && grid[neighbor].is_open()
                    && seen.insert(neighbor)
                {
                    stack.push(neighbor);
                }
            }
        }
        seen
    }
}

use std::collections::{HashMap, HashSet, VecDeque};

use super::{DIRECTIONS, SearchOutcome, TraceEvent, backtrack, step};
use crate::maze::{Coord, Grid};

/// Breadth-first search over open cells with a FIFO frontier.
///
/// Cells are traced in dequeue order. Because the frontier grows in
/// non-decreasing distance from start, the first route found is length-minimal.
pub fn solve_bfs(grid: &Grid, start: Coord, end: Coord) -> SearchOutcome {
    let mut queue = VecDeque::from([start]);
    let mut visited = HashSet::from([start]);
    let mut parent: HashMap<Coord, Coord> = HashMap::new();
    let mut trace = Vec::new();

    while let Some(cell) = queue.pop_front() {
        trace.push(TraceEvent::Cell(cell));

        if cell == end {
            return SearchOutcome {
                trace,
                path: backtrack(&parent, end),
            };
        }

        for dir in DIRECTIONS {
            if let Some(neighbor) = step(grid, cell, dir)
                && grid[neighbor].is_open()
                && visited.insert(neighbor)
            {
                parent.insert(neighbor, cell);
                queue.push_back(neighbor);
            }
        }
    }

    SearchOutcome {
        trace,
        path: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::test_support::open_grid;

    #[test]
    fn test_fixed_tie_break_on_open_grid() {
        // With the E/S/W/N order, the route across a fully open 5x5 grid is
        // pinned: east along the top, then down the last column.
        let grid = open_grid(5, 5);
        let outcome = solve_bfs(&grid, (1, 1), (3, 3));
        assert_eq!(outcome.path, vec![(1, 1), (1, 2), (1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_trace_ends_with_the_end_cell() {
        let grid = open_grid(7, 7);
        let outcome = solve_bfs(&grid, (1, 1), (5, 5));
        assert_eq!(outcome.trace.last(), Some(&TraceEvent::Cell((5, 5))));
    }

    #[test]
    fn test_repeat_runs_agree() {
        let grid = open_grid(9, 11);
        let first = solve_bfs(&grid, (1, 1), (7, 9));
        let second = solve_bfs(&grid, (1, 1), (7, 9));
        assert_eq!(first, second);
    }

    #[test]
    fn test_start_equal_to_end() {
        let grid = open_grid(5, 5);
        let outcome = solve_bfs(&grid, (1, 1), (1, 1));
        assert_eq!(outcome.trace, vec![TraceEvent::Cell((1, 1))]);
        assert_eq!(outcome.path, vec![(1, 1)]);
    }
}

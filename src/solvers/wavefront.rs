use std::collections::{HashMap, HashSet};

use super::{DIRECTIONS, SearchOutcome, TraceEvent, backtrack, step};
use crate::maze::{Coord, Grid};

/// Layer-synchronous search: every cell at the current depth tier is expanded
/// before the next tier begins, and each tier goes into the trace as one
/// event.
///
/// Reaching the end does not cut a layer short. The found flag is only honored
/// once the whole current layer has been expanded and recorded, so the replay
/// always shows complete wavefronts. Expansion order within a layer follows
/// the fixed E/S/W/N neighbor order, which makes the route agree with BFS in
/// length (both are minimal) though the trace groups cells by distance tier
/// instead of revealing them one at a time.
pub fn solve_wavefront(grid: &Grid, start: Coord, end: Coord) -> SearchOutcome {
    let mut current = vec![start];
    let mut visited = HashSet::from([start]);
    let mut parent: HashMap<Coord, Coord> = HashMap::new();
    let mut trace = Vec::new();
    let mut found = false;

    while !current.is_empty() {
        let mut next = Vec::new();

        for &cell in &current {
            if cell == end {
                found = true;
            }
            for dir in DIRECTIONS {
                if let Some(neighbor) = step(grid, cell, dir)
                    && grid[neighbor].is_open()
                    && visited.insert(neighbor)
                {
                    parent.insert(neighbor, cell);
                    next.push(neighbor);
                }
            }
        }

        trace.push(TraceEvent::Layer(current));
        if found {
            break;
        }
        current = next;
    }

    let path = if found {
        backtrack(&parent, end)
    } else {
        Vec::new()
    };
    SearchOutcome { trace, path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Maze;
    use crate::solvers::bfs::solve_bfs;
    use crate::solvers::test_support::open_grid;

    #[test]
    fn test_layers_group_cells_by_distance() {
        let grid = open_grid(5, 5);
        let outcome = solve_wavefront(&grid, (1, 1), (3, 3));
        let layers: Vec<Vec<Coord>> = outcome
            .trace
            .iter()
            .map(|event| event.cells().to_vec())
            .collect();
        assert_eq!(
            layers,
            vec![
                vec![(1, 1)],
                vec![(1, 2), (2, 1)],
                vec![(1, 3), (2, 2), (3, 1)],
                vec![(2, 3), (3, 2)],
                vec![(3, 3)],
            ]
        );
        assert_eq!(outcome.path.len(), 5);
    }

    #[test]
    fn test_final_layer_is_complete_when_end_is_not_a_corner() {
        // End at (1, 5) is four steps out; the distance-4 tier holds five
        // cells and all of them must be traced even though the tier contains
        // the end.
        let grid = open_grid(7, 7);
        let outcome = solve_wavefront(&grid, (1, 1), (1, 5));
        let last: HashSet<Coord> = outcome
            .trace
            .last()
            .expect("empty trace")
            .cells()
            .iter()
            .copied()
            .collect();
        assert_eq!(
            last,
            HashSet::from([(1, 5), (2, 4), (3, 3), (4, 2), (5, 1)])
        );
        assert_eq!(outcome.trace.len(), 5);
    }

    #[test]
    fn test_route_length_matches_bfs() {
        let maze = Maze::new(21, 21, Some(33));
        let wavefront = solve_wavefront(maze.grid(), maze.start(), maze.end());
        let bfs = solve_bfs(maze.grid(), maze.start(), maze.end());
        assert!(!wavefront.path.is_empty());
        assert_eq!(wavefront.path.len(), bfs.path.len());
        // Deterministic on an unchanged grid
        assert_eq!(wavefront, solve_wavefront(maze.grid(), maze.start(), maze.end()));
    }

    #[test]
    fn test_trace_length_is_route_distance_tiers() {
        // One layer per distance tier up to and including the end's tier.
        let maze = Maze::new(15, 15, Some(12));
        let outcome = solve_wavefront(maze.grid(), maze.start(), maze.end());
        assert_eq!(outcome.trace.len(), outcome.path.len());
    }
}

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;

use super::{DIRECTIONS, SearchOutcome, TraceEvent, backtrack, step};
use crate::generator::get_rng;
use crate::maze::{Coord, Grid};

/// Depth-first search over open cells with a LIFO frontier.
///
/// The four directions are reshuffled on every expansion, so repeated runs on
/// the same grid wander differently. No shortest-route guarantee.
pub fn solve_dfs(grid: &Grid, start: Coord, end: Coord, seed: Option<u64>) -> SearchOutcome {
    let mut rng = get_rng(seed);
    let mut stack = vec![start];
    let mut visited = HashSet::from([start]);
    let mut parent: HashMap<Coord, Coord> = HashMap::new();
    let mut trace = Vec::new();

    while let Some(cell) = stack.pop() {
        trace.push(TraceEvent::Cell(cell));

        if cell == end {
            return SearchOutcome {
                trace,
                path: backtrack(&parent, end),
            };
        }

        let mut dirs = DIRECTIONS;
        dirs.shuffle(&mut rng);

        for dir in dirs {
            if let Some(neighbor) = step(grid, cell, dir)
                && grid[neighbor].is_open()
                && visited.insert(neighbor)
            {
                parent.insert(neighbor, cell);
                stack.push(neighbor);
            }
        }
    }

    SearchOutcome {
        trace,
        path: Vec::new(),
    }
}

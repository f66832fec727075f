use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::maze::{CellKind, Coord, Grid};

/// Get a random number generator, optionally seeded for reproducibility.
pub(crate) fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Axis directions as cell jumps of 2, so carving stays on the half-resolution
/// lattice of odd coordinates and the cell in between becomes the passage.
const CARVE_DIRECTIONS: [(i32, i32); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];

/// One in-progress carve site: the cell being expanded plus the directions
/// still to try, in their shuffled order.
struct Frame {
    cell: Coord,
    dirs: [(i32, i32); 4],
    next: usize,
}

impl Frame {
    fn new(cell: Coord, rng: &mut StdRng) -> Self {
        let mut dirs = CARVE_DIRECTIONS;
        dirs.shuffle(rng);
        Frame { cell, dirs, next: 0 }
    }
}

/// Carves a perfect maze with randomized depth-first search and returns the
/// finished grid: walls everywhere except the carved passages, with `(1, 1)`
/// forced to [`CellKind::Start`] and `(rows - 2, cols - 2)` to
/// [`CellKind::End`].
///
/// The end corner is overwritten without checking that carving reached it; on
/// even dimensions it sits off the carving lattice and stays walled in, which
/// searches handle as a no-route grid.
///
/// # Panics
/// If `rows` or `cols` is less than 5, leaving no interior to carve.
pub fn generate(rows: u16, cols: u16, seed: Option<u64>) -> Grid {
    assert!(
        rows >= 5 && cols >= 5,
        "maze dimensions must be at least 5x5, got {}x{}",
        rows,
        cols
    );

    let mut rng = get_rng(seed);
    let mut grid = Grid::new(rows, cols, CellKind::Wall);

    // Strictly inside the border ring, where carving may reach.
    let interior = |r: i32, c: i32| r > 0 && r < rows as i32 - 1 && c > 0 && c < cols as i32 - 1;

    grid[(1, 1)] = CellKind::Path;
    // Explicit stack of carve frames instead of recursion, which would go
    // O(rows * cols / 4) deep. The shuffle-then-iterate order per frame is
    // the same as the recursive formulation's.
    let mut stack = vec![Frame::new((1, 1), &mut rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.dirs.len() {
            stack.pop();
            continue;
        }
        let (dr, dc) = frame.dirs[frame.next];
        frame.next += 1;
        let (r, c) = (frame.cell.0 as i32, frame.cell.1 as i32);

        let (nr, nc) = (r + dr, c + dc);
        if !interior(nr, nc) {
            continue;
        }
        let neighbor = (nr as u16, nc as u16);
        if grid[neighbor] != CellKind::Wall {
            continue;
        }
        // Open the passage cell between, then descend into the neighbor.
        grid[((r + dr / 2) as u16, (c + dc / 2) as u16)] = CellKind::Path;
        grid[neighbor] = CellKind::Path;
        stack.push(Frame::new(neighbor, &mut rng));
    }

    grid[(1, 1)] = CellKind::Start;
    grid[(rows - 2, cols - 2)] = CellKind::End;
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cells_stay_on_the_carving_lattice() {
        // Lattice cells have both coordinates odd; passage cells have exactly
        // one. A cell with both coordinates even can never be opened.
        let grid = generate(21, 21, Some(11));
        for r in 0..21u16 {
            for c in 0..21u16 {
                if r % 2 == 0 && c % 2 == 0 {
                    assert_eq!(grid[(r, c)], CellKind::Wall, "open cell at ({}, {})", r, c);
                }
            }
        }
    }

    #[test]
    fn test_every_lattice_cell_is_carved() {
        let grid = generate(13, 17, Some(23));
        for r in (1..13u16).step_by(2) {
            for c in (1..17u16).step_by(2) {
                assert!(grid[(r, c)].is_open(), "walled lattice cell at ({}, {})", r, c);
            }
        }
    }

    #[test]
    #[should_panic(expected = "at least 5x5")]
    fn test_rejects_degenerate_dimensions() {
        generate(3, 21, None);
    }
}

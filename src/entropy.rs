use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
    mpsc::SyncSender,
};
use std::thread::JoinHandle;
use std::time::Duration;

use rand::Rng;

use crate::maze::Maze;
use crate::replay::{ReplayEvent, ReplayEventKind, RunState};

/// How often entropy fires when enabled.
pub const ENTROPY_INTERVAL: Duration = Duration::from_millis(500);
/// Sleep granularity, a.k.a. how often to check the stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns the background mutation thread. Every interval tick it picks one
/// random interior cell and flips it between wall and path, skipping the
/// start and end cells, then reports the change to the render thread.
///
/// Toggling is suppressed while a search/replay is active so the grid a trace
/// was computed against stays on screen untouched. The running check is
/// repeated under the maze lock, after which a search cannot snapshot until
/// the toggle is done; either the snapshot sees the toggle or the toggle
/// waits for the next tick.
pub fn spawn_entropy(
    maze: Arc<Mutex<Maze>>,
    enabled: Arc<AtomicBool>,
    run_state: Arc<RunState>,
    should_stop: Arc<AtomicBool>,
    event_tx: SyncSender<ReplayEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut rng = rand::rng();
        let mut elapsed = Duration::ZERO;

        loop {
            if should_stop.load(Ordering::Acquire) {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
            elapsed += POLL_INTERVAL;
            if elapsed < ENTROPY_INTERVAL {
                continue;
            }
            elapsed = Duration::ZERO;

            if !enabled.load(Ordering::Acquire) || run_state.is_running() {
                continue;
            }

            let Ok(mut maze) = maze.lock() else {
                // Poisoned lock: a thread panicked mid-update, stop mutating
                break;
            };
            if run_state.is_running() {
                continue;
            }
            let cell = (
                rng.random_range(1..maze.rows() - 1),
                rng.random_range(1..maze.cols() - 1),
            );
            // One attempt per tick; hitting start or end skips the tick
            let Some(kind) = maze.toggle(cell) else {
                continue;
            };
            drop(maze);

            let generation = run_state.generation();
            tracing::debug!("[entropy] toggled {:?} to {:?}", cell, kind);
            if event_tx
                .send(ReplayEvent {
                    generation,
                    kind: ReplayEventKind::Toggled { cell, kind },
                })
                .is_err()
            {
                // Render thread hung up
                break;
            }
        }
        tracing::debug!("[entropy] exiting entropy thread");
    })
}

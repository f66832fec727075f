use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc::SyncSender,
};
use std::thread::JoinHandle;

use crossterm::style::{Color, StyledContent, Stylize};

use crate::maze::{CellKind, Coord, Grid};
use crate::solvers::{self, Strategy, TraceEvent};

/// Gate for the single active search/replay plus the generation counter that
/// invalidates stale work.
///
/// A replay is bound to the generation it began under. Regenerating the maze
/// bumps the generation: drivers abort their event streams, and the renderer
/// drops any events still buffered from before the bump, so pending ticks can
/// never land on a stale grid.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    generation: AtomicU64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the run slot. Returns the generation the run is bound to, or
    /// `None` when a run is already active; the request is dropped, not
    /// queued.
    pub fn try_begin(&self) -> Option<u64> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| self.generation.load(Ordering::Acquire))
    }

    /// Releases the run slot, but only if `generation` is still current. A
    /// stale replay draining late must not clear a newer run.
    pub fn finish(&self, generation: u64) {
        if self.is_current(generation) {
            self.running.store(false, Ordering::Release);
        }
    }

    /// Advances the generation and frees the run slot, invalidating every
    /// in-flight driver and buffered event.
    pub fn bump(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.running.store(false, Ordering::Release);
        next
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }
}

/// One event on the channel feeding the render thread, tagged with the
/// generation it belongs to.
#[derive(Debug, Clone)]
pub struct ReplayEvent {
    pub generation: u64,
    pub kind: ReplayEventKind,
}

#[derive(Debug, Clone)]
pub enum ReplayEventKind {
    /// Redraw the whole grid from a fresh snapshot.
    Grid(Grid),
    /// Reveal explored cells: a single cell for BFS/DFS, a full layer for
    /// wavefront. One event per replay tick either way.
    Explore(Vec<Coord>),
    /// Reveal one cell of the final route.
    Route(Coord),
    /// The replay is over; `found` says whether a route exists.
    Finished { found: bool },
    /// Entropy flipped a cell between wall and path.
    Toggled { cell: Coord, kind: CellKind },
    /// Replace the status line below the grid; `None` clears it.
    Log(Option<StyledContent<String>>),
}

/// Runs a search against the snapshot and streams its replay to the render
/// thread: the fresh grid frame, then the exploration trace one event at a
/// time, then the route reveal, then the terminal status.
///
/// The driver sends events as fast as the bounded channel accepts them; the
/// renderer owns the pacing. It aborts as soon as its generation goes stale
/// or the render side hangs up. It never clears the run slot itself; the
/// renderer does that when it draws the `Finished` event, which is the moment
/// the replay is actually over on screen.
pub fn spawn_replay(
    snapshot: Grid,
    start: Coord,
    end: Coord,
    strategy: Strategy,
    generation: u64,
    run_state: Arc<RunState>,
    event_tx: SyncSender<ReplayEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        tracing::info!("[replay] running {} (generation {})", strategy, generation);
        let outcome = solvers::search(&snapshot, start, end, strategy, None);
        tracing::info!(
            "[replay] {}: {} trace events, route of {} cells",
            strategy,
            outcome.trace.len(),
            outcome.path.len()
        );

        let send = |kind: ReplayEventKind| event_tx.send(ReplayEvent { generation, kind }).is_ok();

        let banner = format!("Running {}...", strategy).with(Color::Cyan);
        if !send(ReplayEventKind::Grid(snapshot)) || !send(ReplayEventKind::Log(Some(banner))) {
            return;
        }

        for event in outcome.trace {
            if !run_state.is_current(generation) {
                tracing::debug!("[replay] generation went stale during trace, aborting");
                return;
            }
            let cells = match event {
                TraceEvent::Cell(cell) => vec![cell],
                TraceEvent::Layer(cells) => cells,
            };
            if !send(ReplayEventKind::Explore(cells)) {
                return;
            }
        }

        let found = !outcome.path.is_empty();
        for cell in outcome.path {
            if !run_state.is_current(generation) {
                tracing::debug!("[replay] generation went stale during route, aborting");
                return;
            }
            if !send(ReplayEventKind::Route(cell)) {
                return;
            }
        }

        send(ReplayEventKind::Finished { found });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Maze;
    use std::sync::mpsc;

    #[test]
    fn test_run_slot_is_exclusive() {
        let state = RunState::new();
        assert_eq!(state.try_begin(), Some(0));
        assert_eq!(state.try_begin(), None);
        state.finish(0);
        assert!(!state.is_running());
        assert_eq!(state.try_begin(), Some(0));
    }

    #[test]
    fn test_stale_finish_does_not_clear_newer_run() {
        let state = RunState::new();
        let stale = state.try_begin().unwrap();
        assert_eq!(state.bump(), 1);
        let current = state.try_begin().unwrap();
        state.finish(stale);
        assert!(state.is_running());
        state.finish(current);
        assert!(!state.is_running());
    }

    fn drain_replay(strategy: Strategy, bump_before: bool) -> Vec<ReplayEventKind> {
        let state = Arc::new(RunState::new());
        let generation = state.try_begin().unwrap();
        if bump_before {
            state.bump();
        }
        let (tx, rx) = mpsc::sync_channel(4096);
        let maze = Maze::new(9, 9, Some(1));
        let handle = spawn_replay(
            maze.snapshot(),
            maze.start(),
            maze.end(),
            strategy,
            generation,
            state,
            tx,
        );
        handle.join().expect("replay thread panicked");
        rx.iter().map(|event| event.kind).collect()
    }

    #[test]
    fn test_replay_stream_shape() {
        let events = drain_replay(Strategy::Bfs, false);
        assert!(matches!(events.first(), Some(ReplayEventKind::Grid(_))));
        assert!(matches!(events.get(1), Some(ReplayEventKind::Log(Some(_)))));
        assert!(matches!(
            events.last(),
            Some(ReplayEventKind::Finished { found: true })
        ));

        let explores = events
            .iter()
            .filter(|kind| matches!(kind, ReplayEventKind::Explore(_)))
            .count();
        let routes = events
            .iter()
            .filter(|kind| matches!(kind, ReplayEventKind::Route(_)))
            .count();
        assert!(explores > 0);
        assert!(routes > 0);

        // The route reveal begins only after the trace is exhausted.
        let last_explore = events
            .iter()
            .rposition(|kind| matches!(kind, ReplayEventKind::Explore(_)))
            .unwrap();
        let first_route = events
            .iter()
            .position(|kind| matches!(kind, ReplayEventKind::Route(_)))
            .unwrap();
        assert!(last_explore < first_route);
    }

    #[test]
    fn test_stale_replay_never_finishes() {
        let events = drain_replay(Strategy::Wavefront, true);
        assert!(
            !events
                .iter()
                .any(|kind| matches!(kind, ReplayEventKind::Finished { .. }))
        );
    }
}

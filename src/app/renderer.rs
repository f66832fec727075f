use std::{
    io::{Stdout, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    },
    time::Duration,
};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Color, StyledContent, Stylize},
    terminal::{self, ClearType},
};

use crate::{
    app::{self, UserActionEvent, history::ReplayHistory},
    maze::{CellKind, Coord, Grid, TileMark},
    replay::{ReplayEvent, ReplayEventKind, RunState},
};

/// Fixed cadence for revealing route cells, not scaled with exploration speed.
const ROUTE_REVEAL_DELAY: Duration = Duration::from_millis(50);
/// Timeout for receiving replay events, a.k.a. how often to check the stop flag
const EVENT_RECV_TIMEOUT: Duration = Duration::from_millis(100);
/// Bounds and step for the adjustable exploration delay
pub const MIN_STEP_DELAY: Duration = Duration::from_millis(10);
pub const MAX_STEP_DELAY: Duration = Duration::from_millis(200);
const STEP_DELAY_INCREMENT: Duration = Duration::from_millis(10);

#[derive(Debug, PartialEq)]
pub enum RendererStatus {
    /// The replay channel closed and everything sent was drawn.
    Completed,
    /// The user cancelled rendering.
    Cancelled,
}

pub struct Renderer {
    /// Standard output handle to write to the terminal
    stdout: Stdout,
    /// The grid as of the last full frame, kept to repaint cells when replay
    /// marks are stepped back or the terminal resizes
    base: Option<Grid>,
    /// History of replay events for browsing while paused
    history: ReplayHistory,
    /// Delay between exploration reveals, adjustable from the keyboard
    explore_delay: Duration,
    /// Shared run gate; cleared when this thread draws a run's final event
    run_state: Arc<RunState>,
}

impl Renderer {
    /// Rows reserved below the grid for the status line.
    pub const NUM_LOG_ROWS: u16 = 2;

    pub fn new(max_history_events: usize, step_delay: Duration, run_state: Arc<RunState>) -> Self {
        Renderer {
            stdout: std::io::stdout(),
            base: None,
            history: ReplayHistory::new(max_history_events),
            explore_delay: step_delay.clamp(MIN_STEP_DELAY, MAX_STEP_DELAY),
            run_state,
        }
    }

    /// Render loop: applies replay events at their pacing and reacts to user
    /// actions between events.
    pub fn render(
        mut self,
        event_rx: Receiver<ReplayEvent>,
        user_action_event_rx: Receiver<UserActionEvent>,
        should_stop: &AtomicBool,
    ) -> std::io::Result<RendererStatus> {
        queue!(self.stdout, terminal::Clear(ClearType::All), cursor::Hide)?;
        self.stdout.flush()?;

        loop {
            if should_stop.load(Ordering::Acquire) {
                return Ok(RendererStatus::Cancelled);
            }

            // Handle any pending user actions without blocking
            loop {
                match user_action_event_rx.try_recv() {
                    Ok(action) => {
                        tracing::debug!("[render] user action: {:?}", action);
                        if !self.handle_action(action, &user_action_event_rx, &event_rx)? {
                            return Ok(RendererStatus::Cancelled);
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break,
                }
            }

            match event_rx.recv_timeout(EVENT_RECV_TIMEOUT) {
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Ok(event) => {
                    if !self.run_state.is_current(event.generation) {
                        // Buffered leftover from before a regenerate
                        continue;
                    }
                    self.apply(&event)?;
                    let pace = self.pace_for(&event.kind);
                    self.history.add_event(event);
                    std::thread::sleep(pace);
                }
            }
        }

        // Move cursor below the maze after exiting
        if let Some(base) = &self.base {
            let rows = base.rows();
            queue!(self.stdout, cursor::MoveTo(0, rows), cursor::Show)?;
            self.stdout.flush()?;
        }
        Ok(RendererStatus::Completed)
    }

    /// Reacts to one user action. Returns `Ok(false)` when rendering should
    /// be cancelled.
    fn handle_action(
        &mut self,
        action: UserActionEvent,
        user_action_event_rx: &Receiver<UserActionEvent>,
        event_rx: &Receiver<ReplayEvent>,
    ) -> std::io::Result<bool> {
        match action {
            UserActionEvent::Pause => self.pause_loop(user_action_event_rx, event_rx),
            UserActionEvent::SpeedUp => {
                self.explore_delay = self
                    .explore_delay
                    .saturating_sub(STEP_DELAY_INCREMENT)
                    .max(MIN_STEP_DELAY);
                self.show_delay()?;
                Ok(true)
            }
            UserActionEvent::SlowDown => {
                self.explore_delay = (self.explore_delay + STEP_DELAY_INCREMENT).min(MAX_STEP_DELAY);
                self.show_delay()?;
                Ok(true)
            }
            UserActionEvent::Resize => {
                self.redraw()?;
                Ok(true)
            }
            UserActionEvent::Cancel => Ok(false),
            // Stepping only means something while paused
            UserActionEvent::Resume | UserActionEvent::Forward | UserActionEvent::Backward => {
                Ok(true)
            }
        }
    }

    /// Blocks on user actions until a Resume or Cancel arrives, stepping
    /// through history on Forward/Backward.
    fn pause_loop(
        &mut self,
        user_action_event_rx: &Receiver<UserActionEvent>,
        event_rx: &Receiver<ReplayEvent>,
    ) -> std::io::Result<bool> {
        loop {
            let Ok(action) = user_action_event_rx.recv() else {
                // Channel disconnected; let the main loop notice shutdown
                return Ok(true);
            };
            match action {
                UserActionEvent::Resume => {
                    // Replay whatever was stepped back before resuming
                    while let Some(event) = self.history.history_forward().cloned() {
                        if !self.run_state.is_current(event.generation) {
                            continue;
                        }
                        tracing::debug!("[render] fast-forwarding history for resume");
                        self.apply(&event)?;
                        std::thread::sleep(self.pace_for(&event.kind));
                    }
                    return Ok(true);
                }
                UserActionEvent::Pause => {
                    // Already paused, ignore
                }
                UserActionEvent::Forward => {
                    if let Some(event) = self.history.history_forward().cloned() {
                        if self.run_state.is_current(event.generation) {
                            self.apply(&event)?;
                        }
                    } else {
                        // At the newest point in history; step into the future
                        match event_rx.try_recv() {
                            Ok(event) => {
                                if self.run_state.is_current(event.generation) {
                                    self.apply(&event)?;
                                    self.history.add_event(event);
                                }
                            }
                            Err(TryRecvError::Empty) => {
                                tracing::debug!("[render] no future event available");
                            }
                            Err(TryRecvError::Disconnected) => {
                                tracing::debug!("[render] replay channel disconnected");
                            }
                        }
                    }
                }
                UserActionEvent::Backward => {
                    if let Some(event) = self.history.current_event().cloned()
                        && self.revert(&event)?
                    {
                        self.history.history_backward();
                    }
                }
                UserActionEvent::SpeedUp | UserActionEvent::SlowDown | UserActionEvent::Resize => {
                    if !self.handle_action(action, user_action_event_rx, event_rx)? {
                        return Ok(false);
                    }
                }
                UserActionEvent::Cancel => return Ok(false),
            }
        }
    }

    fn pace_for(&self, kind: &ReplayEventKind) -> Duration {
        match kind {
            ReplayEventKind::Explore(_) => self.explore_delay,
            ReplayEventKind::Route(_) => ROUTE_REVEAL_DELAY,
            _ => Duration::ZERO,
        }
    }

    /// Draws one replay event and updates renderer state.
    fn apply(&mut self, event: &ReplayEvent) -> std::io::Result<()> {
        match &event.kind {
            ReplayEventKind::Grid(grid) => {
                self.base = Some(grid.clone());
                self.draw_full()?;
                self.log(None)?;
            }
            ReplayEventKind::Explore(cells) => {
                for &cell in cells {
                    self.draw_mark(cell, TileMark::Visited)?;
                }
            }
            ReplayEventKind::Route(cell) => {
                self.draw_mark(*cell, TileMark::Route)?;
            }
            ReplayEventKind::Toggled { cell, kind } => {
                if let Some(base) = &mut self.base {
                    if base.in_bounds(*cell) {
                        base[*cell] = *kind;
                    }
                }
                self.draw_cell(*cell)?;
            }
            ReplayEventKind::Finished { found } => {
                let message = if *found {
                    "Route found!".to_string().with(Color::Green)
                } else {
                    "No route found.".to_string().with(Color::Yellow)
                };
                self.log(Some(message))?;
                // The replay is over on screen; free the run slot
                self.run_state.finish(event.generation);
            }
            ReplayEventKind::Log(message) => {
                self.log(message.clone())?;
            }
        }
        Ok(())
    }

    /// Undoes one replay event on screen. Returns `Ok(false)` for events that
    /// cannot be stepped back (full frames, status lines).
    fn revert(&mut self, event: &ReplayEvent) -> std::io::Result<bool> {
        match &event.kind {
            ReplayEventKind::Explore(cells) => {
                for &cell in cells {
                    self.draw_cell(cell)?;
                }
                Ok(true)
            }
            ReplayEventKind::Route(cell) => {
                // Route cells were explored first, so they fall back to the
                // visited mark
                self.draw_mark(*cell, TileMark::Visited)?;
                Ok(true)
            }
            ReplayEventKind::Toggled { cell, .. } => {
                if let Some(base) = &mut self.base {
                    if base.in_bounds(*cell) {
                        base[*cell] = match base[*cell] {
                            CellKind::Wall => CellKind::Path,
                            other => {
                                debug_assert_eq!(other, CellKind::Path);
                                CellKind::Wall
                            }
                        };
                    }
                }
                self.draw_cell(*cell)?;
                Ok(true)
            }
            ReplayEventKind::Grid(_)
            | ReplayEventKind::Finished { .. }
            | ReplayEventKind::Log(_) => Ok(false),
        }
    }

    /// Repaints the whole base grid.
    fn draw_full(&mut self) -> std::io::Result<()> {
        let Some(base) = &self.base else {
            return Ok(());
        };
        self.stdout.queue(cursor::MoveTo(0, 0))?;
        for r in 0..base.rows() {
            for c in 0..base.cols() {
                self.stdout.queue(style::Print(base[(r, c)]))?;
            }
            self.stdout.queue(style::Print("\r\n"))?;
        }
        self.stdout.flush()
    }

    /// Repaints one cell in its base kind.
    fn draw_cell(&mut self, coord: Coord) -> std::io::Result<()> {
        let Some(base) = &self.base else {
            return Ok(());
        };
        if !base.in_bounds(coord) {
            return Ok(());
        }
        let kind = base[coord];
        queue!(
            self.stdout,
            cursor::MoveTo(coord.1 * CellKind::CELL_WIDTH, coord.0),
            style::Print(kind)
        )?;
        self.stdout.flush()
    }

    /// Draws a replay mark over a cell, keeping the start and end glyphs
    /// visible through the overlay.
    fn draw_mark(&mut self, coord: Coord, mark: TileMark) -> std::io::Result<()> {
        let Some(base) = &self.base else {
            return Ok(());
        };
        if !base.in_bounds(coord) || matches!(base[coord], CellKind::Start | CellKind::End) {
            return Ok(());
        }
        queue!(
            self.stdout,
            cursor::MoveTo(coord.1 * CellKind::CELL_WIDTH, coord.0),
            style::Print(mark)
        )?;
        self.stdout.flush()
    }

    /// Repaints everything after a terminal resize: the base grid, then every
    /// replay mark still applied according to history.
    fn redraw(&mut self) -> std::io::Result<()> {
        let Some(base) = &self.base else {
            return Ok(());
        };
        let (term_cols, term_rows) = terminal::size()?;
        if term_cols < base.cols() * CellKind::CELL_WIDTH
            || term_rows < base.rows() + Renderer::NUM_LOG_ROWS
        {
            let message = format!(
                "Terminal is too small for the {}x{} grid. Please resize.",
                base.rows(),
                base.cols()
            )
            .with(Color::Yellow);
            return self.log(Some(message));
        }

        let mut marks: Vec<(Coord, Option<TileMark>)> = Vec::new();
        for event in self.history.applied() {
            if !self.run_state.is_current(event.generation) {
                continue;
            }
            match &event.kind {
                // A full frame supersedes every mark before it
                ReplayEventKind::Grid(_) => marks.clear(),
                ReplayEventKind::Explore(cells) => {
                    marks.extend(cells.iter().map(|&cell| (cell, Some(TileMark::Visited))));
                }
                ReplayEventKind::Route(cell) => marks.push((*cell, Some(TileMark::Route))),
                ReplayEventKind::Toggled { cell, .. } => marks.push((*cell, None)),
                _ => {}
            }
        }

        self.draw_full()?;
        for (cell, mark) in marks {
            match mark {
                Some(mark) => self.draw_mark(cell, mark)?,
                None => self.draw_cell(cell)?,
            }
        }
        Ok(())
    }

    fn show_delay(&mut self) -> std::io::Result<()> {
        let message =
            format!("Step delay: {} ms", self.explore_delay.as_millis()).with(Color::Cyan);
        self.log(Some(message))
    }

    fn log(&mut self, message: Option<StyledContent<String>>) -> std::io::Result<()> {
        let row = self.base.as_ref().map_or(0, |base| base.rows());
        app::log_terminal(&mut self.stdout, row, message)
    }
}

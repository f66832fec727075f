mod history;
mod renderer;

use std::{
    io::{Stdout, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, SyncSender, TrySendError},
    },
    thread::JoinHandle,
    time::Duration,
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, StyledContent, Stylize},
    terminal::{self, ClearType},
};

use crate::{
    entropy::spawn_entropy,
    maze::{CellKind, Maze},
    replay::{self, ReplayEvent, ReplayEventKind, RunState},
    solvers::Strategy,
};
use renderer::{MAX_STEP_DELAY, MIN_STEP_DELAY, Renderer, RendererStatus};

enum UserInputEvent {
    KeyPress(event::KeyEvent),
    Resize,
}

#[derive(Debug)]
pub enum UserActionEvent {
    /// Pause the replay
    Pause,
    /// Resume the replay
    Resume,
    /// Step forward in history or to the future when paused
    Forward,
    /// Step backward in history when paused
    Backward,
    /// Terminal resize
    Resize,
    /// Increase replay speed
    SpeedUp,
    /// Decrease replay speed
    SlowDown,
    /// Cancel rendering
    Cancel,
}

/// Maximum number of replay events to buffer in the channel between the
/// driver/entropy threads and the render thread
const MAX_EVENTS_IN_CHANNEL_BUFFER: usize = 1000;
/// Timeout for receiving input events, a.k.a. how often to check whether the
/// render thread is done
const INPUT_RECV_TIMEOUT: Duration = Duration::from_millis(100);
/// Timeout for polling input events in the input thread, a.k.a. how often to
/// check the stop flag
const USER_INPUT_EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
/// Maximum number of replay events to keep for history browsing when paused
const MAX_HISTORY_REPLAY_EVENTS: usize = 10000;

/// Smallest accepted grid dimension, leaving room for a border and interior
const MIN_DIMENSION: u16 = 5;
/// Default grid dimension when the user just presses Enter
const DEFAULT_DIMENSION: u16 = 21;
/// Default replay step delay when the user just presses Enter
const DEFAULT_STEP_DELAY_MS: u128 = 50;

/// Set a panic hook to restore terminal state on panic, so the terminal is
/// not left in raw mode or the alternate screen even if the panic happens on
/// another thread.
fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal(&mut std::io::stdout()); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

/// Setup terminal in raw mode and enter alternate screen
/// Also sets a panic hook to restore terminal on panic
pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    set_panic_hook();
    queue!(
        stdout,
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide,
        cursor::MoveTo(0, 0)
    )?;
    stdout.flush()
}

/// Restore terminal to original state
/// Leave alternate screen and disable raw mode
pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    queue!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
    stdout.flush()?;
    terminal::disable_raw_mode()
}

/// Entry point of the visualizer session.
pub fn run(stdout: &mut Stdout) -> std::io::Result<()> {
    queue!(
        stdout,
        style::SetAttribute(Attribute::Reverse),
        style::PrintStyledContent("wavemaze\r\n".with(Color::Yellow)),
        style::SetAttribute(Attribute::NoReverse),
    )?;
    stdout.flush()?;

    let Some((rows, cols)) = ask_grid_dimensions(stdout)? else {
        return Ok(());
    };
    let Some(step_delay) = ask_step_delay(stdout)? else {
        return Ok(());
    };
    let entropy_on = match select_from_menu(
        stdout,
        "Enable entropy (random wall toggling while idle)? (use arrow keys and Enter, or Esc to exit):",
        &["No", "Yes"],
    )? {
        Some(choice) => choice == "Yes",
        None => {
            return Ok(());
        }
    };

    queue!(
        stdout,
        style::PrintStyledContent(
            "Controls:\r\n"
                .with(Color::Yellow)
                .attribute(Attribute::Bold)
        ),
        style::PrintStyledContent("  b/d/q: Run BFS / DFS / quantum wavefront\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  r: Regenerate maze   e: Toggle entropy\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  Enter: Pause/Resume replay\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  ←/→: Step backward/forward when paused\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  ↑/↓: Speed up/slow down replay\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  Esc: Exit\r\n\r\n".with(Color::Cyan)),
    )?;
    stdout.flush()?;

    let proceed = match select_from_menu(stdout, "Start the session?", &["Start", "Exit"])? {
        Some(choice) => choice == "Start",
        None => false,
    };
    if !proceed {
        return Ok(());
    }

    let maze = Arc::new(Mutex::new(Maze::new(rows, cols, None)));
    let run_state = Arc::new(RunState::new());
    let should_stop = Arc::new(AtomicBool::new(false));
    let entropy_enabled = Arc::new(AtomicBool::new(entropy_on));

    let (user_input_event_tx, user_input_event_rx) = std::sync::mpsc::channel::<UserInputEvent>();
    let (user_action_event_tx, user_action_event_rx) =
        std::sync::mpsc::channel::<UserActionEvent>();
    let (replay_event_tx, replay_event_rx) =
        std::sync::mpsc::sync_channel::<ReplayEvent>(MAX_EVENTS_IN_CHANNEL_BUFFER);

    // Spawn a thread to listen for user input
    let should_stop_for_input = should_stop.clone();
    let input_thread_handle = std::thread::spawn(move || -> std::io::Result<()> {
        listen_to_user_input(
            user_input_event_tx,
            USER_INPUT_EVENT_POLL_TIMEOUT,
            &should_stop_for_input,
        )
    });

    // Spawn a thread to draw replay events as they arrive
    let run_state_for_render = run_state.clone();
    let should_stop_for_render = should_stop.clone();
    let render_thread_handle = std::thread::spawn(move || {
        Renderer::new(MAX_HISTORY_REPLAY_EVENTS, step_delay, run_state_for_render).render(
            replay_event_rx,
            user_action_event_rx,
            &should_stop_for_render,
        )
    });

    // Spawn the background mutation thread
    let entropy_thread_handle = spawn_entropy(
        maze.clone(),
        entropy_enabled.clone(),
        run_state.clone(),
        should_stop.clone(),
        replay_event_tx.clone(),
    );

    // First frame: the freshly generated maze
    send_frame(&maze, run_state.generation(), &replay_event_tx);

    let replay_thread_handles = session_loop(
        &maze,
        &run_state,
        &entropy_enabled,
        &should_stop,
        &user_input_event_rx,
        &user_action_event_tx,
        &replay_event_tx,
        &render_thread_handle,
    );

    // Whatever ended the session, make sure every thread sees the stop flag,
    // and hang up our channel ends so a paused renderer unblocks
    should_stop.store(true, Ordering::Release);
    drop(user_action_event_tx);
    drop(replay_event_tx);

    // Wait for input thread to finish
    input_thread_handle.join().expect("Input thread panicked")?;

    // Render thread exits on the stop flag; once its receiver is gone the
    // driver and entropy threads fail their sends and exit too
    let status = render_thread_handle
        .join()
        .expect("Render thread panicked")?;
    entropy_thread_handle.join().expect("Entropy thread panicked");
    for handle in replay_thread_handles {
        handle.join().expect("Replay thread panicked");
    }

    if let RendererStatus::Cancelled = status {
        tracing::info!("Session was cancelled by user.");
    }
    Ok(())
}

/// Main thread loop: translates user input into renderer actions and session
/// commands. Returns the handles of any replay driver threads it spawned.
#[allow(clippy::too_many_arguments)]
fn session_loop(
    maze: &Arc<Mutex<Maze>>,
    run_state: &Arc<RunState>,
    entropy_enabled: &AtomicBool,
    should_stop: &AtomicBool,
    user_input_event_rx: &Receiver<UserInputEvent>,
    user_action_event_tx: &Sender<UserActionEvent>,
    replay_event_tx: &SyncSender<ReplayEvent>,
    render_thread_handle: &JoinHandle<std::io::Result<RendererStatus>>,
) -> Vec<JoinHandle<()>> {
    tracing::info!("Started main session loop");
    let mut replay_threads = Vec::new();
    // Flag to indicate if the replay is currently paused
    let mut is_paused = false;

    loop {
        // Check if the render thread is done
        if render_thread_handle.is_finished() {
            should_stop.store(true, Ordering::Release);
            break;
        }

        let event = match user_input_event_rx.recv_timeout(INPUT_RECV_TIMEOUT) {
            Err(e) => {
                match e {
                    std::sync::mpsc::RecvTimeoutError::Timeout => {
                        // Skip to next iteration to check the render thread again
                        continue;
                    }
                    std::sync::mpsc::RecvTimeoutError::Disconnected => {
                        // Input thread has exited, break the loop
                        break;
                    }
                }
            }
            Ok(event) => event,
        };

        let action = match event {
            UserInputEvent::Resize => Some(UserActionEvent::Resize),
            UserInputEvent::KeyPress(key_event) => match key_event.code {
                // Exit on Esc key
                KeyCode::Esc => {
                    tracing::debug!("[session loop] Esc key pressed, notifying renderer");
                    // Error only happens if the renderer exited already
                    user_action_event_tx.send(UserActionEvent::Cancel).ok();
                    should_stop.store(true, Ordering::Release);
                    break;
                }
                KeyCode::Enter => {
                    // Toggle pause/resume on Enter key
                    let action = if is_paused {
                        UserActionEvent::Resume
                    } else {
                        UserActionEvent::Pause
                    };
                    is_paused = !is_paused;
                    Some(action)
                }
                KeyCode::Left if is_paused => Some(UserActionEvent::Backward),
                KeyCode::Right if is_paused => Some(UserActionEvent::Forward),
                KeyCode::Up => Some(UserActionEvent::SpeedUp),
                KeyCode::Down => Some(UserActionEvent::SlowDown),
                KeyCode::Char(c) => {
                    match c.to_ascii_lowercase() {
                        'b' => start_replay(Strategy::Bfs, maze, run_state, replay_event_tx, &mut replay_threads),
                        'd' => start_replay(Strategy::Dfs, maze, run_state, replay_event_tx, &mut replay_threads),
                        'q' => start_replay(Strategy::Wavefront, maze, run_state, replay_event_tx, &mut replay_threads),
                        'r' => regenerate(maze, run_state, replay_event_tx),
                        'e' => toggle_entropy(entropy_enabled, run_state, replay_event_tx),
                        _ => {}
                    }
                    None
                }
                _ => None, // Ignore other keys
            },
        };

        // Send the user action event to the render thread
        if let Some(action) = action
            && user_action_event_tx.send(action).is_err()
        {
            // Render thread has exited
            break;
        }
    }
    tracing::info!("Exiting main session loop");
    replay_threads
}

/// Starts a search replay unless one is already active, in which case the
/// request is dropped.
fn start_replay(
    strategy: Strategy,
    maze: &Arc<Mutex<Maze>>,
    run_state: &Arc<RunState>,
    replay_event_tx: &SyncSender<ReplayEvent>,
    replay_threads: &mut Vec<JoinHandle<()>>,
) {
    let Some(generation) = run_state.try_begin() else {
        tracing::debug!("[session] {} requested while a run is active, ignoring", strategy);
        return;
    };
    let Ok(guard) = maze.lock() else {
        run_state.finish(generation);
        return;
    };
    let snapshot = guard.snapshot();
    let (start, end) = (guard.start(), guard.end());
    drop(guard);

    replay_threads.push(replay::spawn_replay(
        snapshot,
        start,
        end,
        strategy,
        generation,
        run_state.clone(),
        replay_event_tx.clone(),
    ));
}

/// Re-carves the maze and invalidates whatever replay was in flight.
fn regenerate(
    maze: &Arc<Mutex<Maze>>,
    run_state: &Arc<RunState>,
    replay_event_tx: &SyncSender<ReplayEvent>,
) {
    let generation = run_state.bump();
    {
        let Ok(mut guard) = maze.lock() else {
            return;
        };
        guard.regenerate(None);
    }
    tracing::info!("[session] maze regenerated (generation {})", generation);
    send_frame(maze, generation, replay_event_tx);
}

fn toggle_entropy(
    entropy_enabled: &AtomicBool,
    run_state: &RunState,
    replay_event_tx: &SyncSender<ReplayEvent>,
) {
    let enabled = !entropy_enabled.load(Ordering::Acquire);
    entropy_enabled.store(enabled, Ordering::Release);
    tracing::info!("[session] entropy {}", if enabled { "enabled" } else { "disabled" });
    let message = format!("Entropy {}", if enabled { "on" } else { "off" }).with(Color::Magenta);
    try_send_event(
        replay_event_tx,
        ReplayEvent {
            generation: run_state.generation(),
            kind: ReplayEventKind::Log(Some(message)),
        },
    );
}

/// Sends a full grid frame followed by a ready status.
fn send_frame(maze: &Arc<Mutex<Maze>>, generation: u64, replay_event_tx: &SyncSender<ReplayEvent>) {
    let Ok(guard) = maze.lock() else {
        return;
    };
    let snapshot = guard.snapshot();
    drop(guard);
    try_send_event(
        replay_event_tx,
        ReplayEvent {
            generation,
            kind: ReplayEventKind::Grid(snapshot),
        },
    );
    try_send_event(
        replay_event_tx,
        ReplayEvent {
            generation,
            kind: ReplayEventKind::Log(Some("Ready".to_string().with(Color::Blue))),
        },
    );
}

/// Non-blocking send for the session thread, which must stay responsive even
/// when the render channel is saturated by a paused replay.
fn try_send_event(replay_event_tx: &SyncSender<ReplayEvent>, event: ReplayEvent) {
    match replay_event_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!("[session] replay channel full, dropping event");
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

/// Listen for user input events (key presses and resize)
/// This function runs in a separate thread, and is the only place where user input is read
fn listen_to_user_input(
    user_input_event_tx: Sender<UserInputEvent>,
    event_poll_timeout: Duration,
    should_stop: &AtomicBool,
) -> std::io::Result<()> {
    loop {
        // Check if this thread should exit
        if should_stop.load(Ordering::Acquire) {
            return Ok(());
        }

        // Poll for events with a timeout
        if !event::poll(event_poll_timeout)? {
            // No event available, continue loop to check the flag again
            continue;
        }

        // Read the next event
        // We only care about key press and resize events
        let input_event = match event::read()? {
            event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                UserInputEvent::KeyPress(key_event)
            }
            event::Event::Resize(_, _) => UserInputEvent::Resize,
            _ => continue, // Ignore other events
        };

        // Should exit input thread on Esc key
        let should_exit = matches!(
            input_event,
            UserInputEvent::KeyPress(event::KeyEvent {
                code: KeyCode::Esc,
                ..
            })
        );

        // Send the input event to the main thread
        if user_input_event_tx.send(input_event).is_err() {
            // Receiver has been dropped, exit the thread
            return Ok(());
        }

        if should_exit {
            tracing::debug!("[input loop] Esc key pressed, exiting");
            return Ok(());
        }
    }
}

/// Print a message on the line just below the grid, replacing whatever was
/// there. `None` clears the line.
pub(crate) fn log_terminal(
    stdout: &mut Stdout,
    grid_height: u16,
    message: Option<StyledContent<String>>,
) -> std::io::Result<()> {
    queue!(
        stdout,
        cursor::MoveTo(0, grid_height),
        terminal::Clear(ClearType::CurrentLine)
    )?;
    if let Some(message) = message {
        stdout.queue(style::PrintStyledContent(message))?;
    }
    stdout.flush()
}

/// Largest odd grid dimension that fits in `term_size` terminal cells of
/// `cell_size` characters each.
fn max_grid_dimension(term_size: u16, cell_size: u16) -> u16 {
    let available = term_size / cell_size.max(1);
    let odd = if available % 2 == 0 {
        available.saturating_sub(1)
    } else {
        available
    };
    odd.max(MIN_DIMENSION)
}

/// Ask the user for the grid dimensions (odd, at least 5, bounded by the
/// terminal). Returns `None` if the user cancels with Esc.
fn ask_grid_dimensions(stdout: &mut Stdout) -> std::io::Result<Option<(u16, u16)>> {
    stdout.execute(style::PrintStyledContent(
        "Enter odd grid dimensions, or press Esc to exit. Empty input picks the default. \
Maximum acceptable values are based on current terminal size.\r\n"
            .with(Color::Blue),
    ))?;

    let validate = |s: &str, max: u16| -> Result<u16, String> {
        if s.trim().is_empty() {
            return Ok(DEFAULT_DIMENSION.min(max));
        }
        let error = format!(
            "Please enter an odd number between {} and {}.",
            MIN_DIMENSION, max
        );
        s.trim()
            .parse::<u16>()
            .map_err(|_| error.clone())
            .and_then(|n| {
                if (MIN_DIMENSION..=max).contains(&n) && n % 2 == 1 {
                    Ok(n)
                } else {
                    Err(error)
                }
            })
    };

    let (term_cols, term_rows) = terminal::size().unwrap_or((u16::MAX, u16::MAX));
    let max_rows = max_grid_dimension(term_rows.saturating_sub(Renderer::NUM_LOG_ROWS), 1);
    let max_cols = max_grid_dimension(term_cols, CellKind::CELL_WIDTH);

    let Some(rows) = prompt_with_validation(stdout, "Rows: ", |s| validate(s, max_rows))? else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Rows set to {}\r\n", rows)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let Some(cols) = prompt_with_validation(stdout, "Columns: ", |s| validate(s, max_cols))? else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Columns set to {}\r\n", cols)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    Ok(Some((rows, cols)))
}

/// Ask the user for the initial replay step delay in milliseconds.
fn ask_step_delay(stdout: &mut Stdout) -> std::io::Result<Option<Duration>> {
    let min = MIN_STEP_DELAY.as_millis();
    let max = MAX_STEP_DELAY.as_millis();
    let validate = |s: &str| -> Result<Duration, String> {
        if s.trim().is_empty() {
            return Ok(Duration::from_millis(DEFAULT_STEP_DELAY_MS as u64));
        }
        let error = format!("Please enter a number of milliseconds between {} and {}.", min, max);
        s.trim()
            .parse::<u64>()
            .map_err(|_| error.clone())
            .and_then(|n| {
                if (min..=max).contains(&(n as u128)) {
                    Ok(Duration::from_millis(n))
                } else {
                    Err(error)
                }
            })
    };

    let Some(delay) = prompt_with_validation(stdout, "Step delay (ms): ", validate)? else {
        return Ok(None);
    };
    stdout.execute(style::PrintStyledContent(
        format!("Step delay set to {} ms\r\n", delay.as_millis())
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;
    Ok(Some(delay))
}

/// Get user input with real-time validation and feedback.
/// Returns `None` if the user cancels input with Esc, `Some(T)` once the
/// input validates and Enter is pressed.
fn prompt_with_validation<F, T>(
    stdout: &mut Stdout,
    prompt: &str,
    validate: F,
) -> std::io::Result<Option<T>>
where
    F: Fn(&str) -> Result<T, String>,
{
    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;
    stdout.flush()?;

    let mut input = String::new();

    let value = loop {
        // Re-render prompt line
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(
            prompt.with(Color::Cyan).attribute(Attribute::Bold),
        ))?;

        // Color the input by validity
        let validation_result = validate(&input);
        let input_color = match validation_result {
            Ok(_) => Color::Green,
            Err(_) => Color::Red,
        };
        queue!(
            stdout,
            style::SetForegroundColor(input_color),
            style::Print(&input),
            style::ResetColor,
            style::Print(" \r\n")
        )?;

        // Error message line (if any)
        if let Err(msg) = validation_result {
            stdout.queue(style::PrintStyledContent(
                msg.with(Color::DarkGrey).attribute(Attribute::Dim),
            ))?;
        }
        stdout.flush()?;

        // Wait for key event
        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            match code {
                KeyCode::Enter => {
                    if let Ok(value) = validate(&input) {
                        break Some(value);
                    }
                    // invalid, re-render
                }
                KeyCode::Char(c) if kind == event::KeyEventKind::Press => {
                    if !c.is_whitespace() && !c.is_control() {
                        input.push(c);
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => {
                    // User cancelled input
                    break None;
                }
                _ => {}
            }
        }
    };

    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(value)
}

/// Present a menu of options and let the user pick one with the arrow keys.
/// Returns `None` if the user cancels with Esc.
fn select_from_menu<T: std::fmt::Display + Copy>(
    stdout: &mut Stdout,
    prompt: &str,
    options: &[T],
) -> std::io::Result<Option<T>> {
    if options.is_empty() {
        return Ok(None);
    }

    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;

    let mut selected = 0;

    let selected_option = loop {
        // Re-render prompt and options
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(prompt.with(Color::Yellow)))?;

        for (i, option) in options.iter().enumerate() {
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::Reverse))?;
            }
            stdout.queue(style::Print(format!("\r\n{}", option)))?;
            if i == selected {
                stdout.queue(style::SetAttribute(Attribute::NoReverse))?;
            }
        }
        stdout.queue(style::Print("\r\n"))?;
        stdout.flush()?;

        // Wait for key event
        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                // Only handle key press events
                continue;
            }
            match code {
                KeyCode::Up => {
                    selected = match selected {
                        0 => options.len() - 1,
                        _ => selected - 1,
                    };
                }
                KeyCode::Down => {
                    selected = if selected >= options.len() - 1 {
                        0
                    } else {
                        selected + 1
                    };
                }
                KeyCode::Enter => {
                    break Some(options[selected]);
                }
                KeyCode::Esc => {
                    // User cancelled input
                    break None;
                }
                _ => {}
            }
        }
    };

    // Cleanup
    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(selected_option)
}

//! Receiver controller loop and terminal orchestration.
//!
//! One event is reduced at a time and the view is redrawn after each.
//! Transport, key input and resizes arrive as messages; nothing in the
//! loop blocks on I/O.

use std::io::{self, Stdout};
use std::sync::Once;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    prelude::{CrosstermBackend, Terminal},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::event::{TransferEvent, UiEvent};
use super::model::{reduce, Command, ReceiverModel};
use super::styles::phase_style;
use super::view::render;
use crate::common::ReceiverSettings;

/// Terminal input poll interval for the blocking reader
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const UI_EVENT_BUFFER: usize = 64;

/// Why the controller loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverExit {
    /// A configured quit key was pressed
    Quit,
    /// The caller cancelled the loop
    Cancelled,
}

/// Run the controller until a quit key or cancellation.
///
/// A closed event channel is not an exit condition: the final view stays
/// up and keeps animating until the user quits.
pub async fn drive<B: Backend>(
    terminal: &mut Terminal<B>,
    mut model: ReceiverModel,
    mut events: mpsc::Receiver<UiEvent>,
    tick_interval: Duration,
    cancel: CancellationToken,
) -> io::Result<(ReceiverModel, ReceiverExit)> {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events_open = true;

    terminal.draw(|f| draw(f, &model))?;

    loop {
        let event = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                return Ok((model, ReceiverExit::Cancelled));
            }

            received = events.recv(), if events_open => match received {
                Some(event) => event,
                None => {
                    tracing::debug!("Receiver event source closed");
                    events_open = false;
                    continue;
                }
            },

            _ = ticker.tick() => UiEvent::Tick,
        };

        let (next, command) = reduce(model, event);
        model = next;
        terminal.draw(|f| draw(f, &model))?;

        if command == Command::Quit {
            return Ok((model, ReceiverExit::Quit));
        }
    }
}

fn draw(frame: &mut Frame, model: &ReceiverModel) {
    let widget = Paragraph::new(render(model)).style(phase_style(model.phase()));
    frame.render_widget(widget, frame.size());
}

/// Take over the terminal and display transfer events until the user quits
/// or `cancel` fires. Quitting does not stop the transport; the caller owns
/// that.
///
/// Library entry point for the receive side of a transfer: the `portal`
/// binary only runs the rendezvous server. Display settings come from the
/// `[receiver]` config section.
pub async fn run_terminal_receiver(
    transfer_events: mpsc::Receiver<TransferEvent>,
    settings: ReceiverSettings,
    cancel: CancellationToken,
) -> io::Result<ReceiverExit> {
    install_panic_hook();

    // Size first: nothing has touched the terminal yet if this fails
    let (width, height) = crossterm::terminal::size()?;
    let mut terminal = enter_terminal()?;

    let (ui_tx, ui_rx) = mpsc::channel(UI_EVENT_BUFFER);
    // Capacity is fresh, so this cannot fail
    let _ = ui_tx.try_send(UiEvent::Resize { width, height });

    let input_token = cancel.child_token();
    let input_task = spawn_input_reader(ui_tx.clone(), input_token.clone());
    let forward_task = tokio::spawn(forward_transfer_events(transfer_events, ui_tx));

    let tick = settings.tick_interval();
    let result = drive(
        &mut terminal,
        ReceiverModel::new(settings),
        ui_rx,
        tick,
        cancel,
    )
    .await;

    input_token.cancel();
    forward_task.abort();
    if let Err(err) = input_task.await {
        tracing::warn!("Terminal input reader ended abnormally: {}", err);
    }

    cleanup_terminal(&mut terminal)?;
    let (_, exit) = result?;
    Ok(exit)
}

/// Raw mode plus alternate screen. Any step that fails undoes the earlier ones.
fn enter_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;

    let entered = execute!(io::stdout(), EnterAlternateScreen)
        .and_then(|_| Terminal::new(CrosstermBackend::new(io::stdout())));
    if entered.is_err() {
        restore_terminal();
    }
    entered
}

async fn forward_transfer_events(
    mut transfer_events: mpsc::Receiver<TransferEvent>,
    ui_tx: mpsc::Sender<UiEvent>,
) {
    while let Some(event) = transfer_events.recv().await {
        if ui_tx.send(UiEvent::Transfer(event)).await.is_err() {
            break;
        }
    }
}

/// Blocking crossterm reader feeding key presses and resizes into the loop.
fn spawn_input_reader(
    ui_tx: mpsc::Sender<UiEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(INPUT_POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    tracing::warn!("Failed to poll terminal input: {}", err);
                    break;
                }
            }

            let ui_event = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => UiEvent::Key(key),
                Ok(Event::Resize(width, height)) => UiEvent::Resize { width, height },
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!("Failed to read terminal input: {}", err);
                    break;
                }
            };

            if ui_tx.blocking_send(ui_event).is_err() {
                break;
            }
        }
    })
}

static PANIC_HOOK: Once = Once::new();

/// Install, once per process, a panic hook that restores the terminal before
/// printing the panic.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore_terminal();
            original_hook(panic_info);
        }));
    });
}

/// Best-effort restore for error and panic paths.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Cleanup terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

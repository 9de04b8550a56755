//! Receiver display state and the reducer that drives it.
//!
//! Phases only move forward: Establishing -> ReceivingProgress -> Finished.
//! `Error` is reachable from any non-terminal phase. Once `Finished` or
//! `Error` is reached, transfer events are accepted but change nothing.

use crossterm::event::KeyEvent;

use super::event::{key_name, TransferEvent, UiEvent};
use crate::common::ReceiverSettings;

/// Progress bar width before the first resize event.
pub const DEFAULT_VIEWPORT_WIDTH: u16 = 40;

/// Columns reserved around the bar besides the padding on both sides.
const BAR_MARGIN: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Establishing,
    ReceivingProgress,
    Finished,
    Error,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Error)
    }
}

/// What the driving loop should do after a reduce step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
}

#[derive(Debug, Clone)]
pub struct ReceiverModel {
    phase: Phase,
    payload_size: Option<u64>,
    progress: f64,
    received_files: Vec<String>,
    decompressed_size: u64,
    error_message: Option<String>,
    viewport_width: u16,
    spinner_frame: usize,
    settings: ReceiverSettings,
}

impl ReceiverModel {
    pub fn new(settings: ReceiverSettings) -> Self {
        Self {
            phase: Phase::Establishing,
            payload_size: None,
            progress: 0.0,
            received_files: Vec::new(),
            decompressed_size: 0,
            error_message: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH.min(settings.max_width),
            spinner_frame: 0,
            settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Payload size from the first metadata event, 0 before it arrives.
    pub fn payload_size(&self) -> u64 {
        self.payload_size.unwrap_or(0)
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn received_files(&self) -> &[String] {
        &self.received_files
    }

    pub fn decompressed_size(&self) -> u64 {
        self.decompressed_size
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn viewport_width(&self) -> u16 {
        self.viewport_width
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn settings(&self) -> &ReceiverSettings {
        &self.settings
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: UiEvent) -> Command {
        match event {
            UiEvent::Transfer(event) => {
                self.apply_transfer(event);
                Command::None
            }
            UiEvent::Key(key) => {
                if self.is_quit_key(&key) {
                    Command::Quit
                } else {
                    Command::None
                }
            }
            UiEvent::Resize { width, .. } => {
                self.viewport_width = self.bar_width_for(width);
                Command::None
            }
            UiEvent::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Command::None
            }
        }
    }

    fn apply_transfer(&mut self, event: TransferEvent) {
        if self.phase.is_terminal() {
            tracing::trace!("Ignoring {:?} in {:?} phase", event, self.phase);
            return;
        }

        match event {
            TransferEvent::Metadata { total_bytes } => {
                if self.payload_size.is_none() {
                    self.payload_size = Some(total_bytes);
                }
                self.phase = Phase::ReceivingProgress;
            }
            TransferEvent::Progress { fraction } => {
                if !fraction.is_nan() {
                    self.progress = fraction.clamp(0.0, 1.0);
                }
                self.phase = Phase::ReceivingProgress;
            }
            TransferEvent::Completed {
                files,
                decompressed_bytes,
            } => {
                self.received_files = files;
                self.decompressed_size = decompressed_bytes;
                self.progress = 1.0;
                self.phase = Phase::Finished;
            }
            TransferEvent::Failed { message } => {
                self.error_message = Some(message);
                self.phase = Phase::Error;
            }
        }
    }

    fn is_quit_key(&self, key: &KeyEvent) -> bool {
        key_name(key).is_some_and(|name| {
            self.settings
                .quit_keys
                .iter()
                .any(|quit| quit.eq_ignore_ascii_case(&name))
        })
    }

    fn bar_width_for(&self, terminal_width: u16) -> u16 {
        let padding = u16::try_from(self.settings.padding).unwrap_or(u16::MAX);
        terminal_width
            .saturating_sub(padding.saturating_mul(2))
            .saturating_sub(BAR_MARGIN)
            .min(self.settings.max_width)
    }
}

/// Total reducer: every (phase, event) pair yields a next state.
pub fn reduce(mut model: ReceiverModel, event: UiEvent) -> (ReceiverModel, Command) {
    let command = model.apply(event);
    (model, command)
}

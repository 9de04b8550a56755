//! Closed event alphabet consumed by the receiver controller.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events produced by the transfer transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Total payload size, announced once before data flows
    Metadata { total_bytes: u64 },
    /// Fraction of the payload received, in `[0, 1]`
    Progress { fraction: f64 },
    Completed {
        files: Vec<String>,
        decompressed_bytes: u64,
    },
    Failed { message: String },
}

/// Everything the controller loop reduces: transport events plus terminal
/// input and the animation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Transfer(TransferEvent),
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Tick,
}

impl From<TransferEvent> for UiEvent {
    fn from(event: TransferEvent) -> Self {
        UiEvent::Transfer(event)
    }
}

/// Lower-case key name used to match configured quit keys
/// (`"q"`, `"esc"`, `"ctrl+c"`, ...). Keys without a name yield `None`.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_lowercase().collect(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };

    let name = if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("ctrl+{}", base)
    } else if key.modifiers.contains(KeyModifiers::ALT) {
        format!("alt+{}", base)
    } else {
        base
    };
    Some(name)
}

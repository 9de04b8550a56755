use ratatui::style::{Color, Modifier, Style};

use super::model::Phase;

pub(super) fn phase_style(phase: Phase) -> Style {
    match phase {
        Phase::Establishing | Phase::ReceivingProgress => Style::default().fg(Color::Cyan),
        Phase::Finished => Style::default().fg(Color::Green),
        Phase::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

//! Pure rendering of the receiver state to display text.

use super::format::{byte_count_si, indent, progress_bar, spinner_frame, top_level_entries, word_wrap};
use super::model::{Phase, ReceiverModel};

const ESTABLISHING_TEXT: &str = "Establishing connection with sender";

/// Text for the current phase. Same state, same text.
pub fn render(model: &ReceiverModel) -> String {
    let settings = model.settings();
    let pad = " ".repeat(settings.padding);

    match model.phase() {
        Phase::Establishing => format!(
            "\n{}{} {}\n\n",
            pad,
            spinner_frame(model.spinner_frame()),
            ESTABLISHING_TEXT
        ),
        Phase::ReceivingProgress => {
            let receiving = format!(
                "Receiving files (total size {})",
                byte_count_si(model.payload_size())
            );
            format!(
                "\n{pad}{receiving}\n\n{pad}{bar}\n\n{pad}{hint}\n\n",
                pad = pad,
                receiving = receiving,
                bar = bar(model),
                hint = quit_hint(&settings.quit_keys),
            )
        }
        Phase::Finished => {
            let files = model.received_files();
            let mut finished = format!(
                "File transfer completed! Received {} files ({} decompressed)",
                files.len(),
                byte_count_si(model.decompressed_size())
            );

            let entries = top_level_entries(files);
            if !entries.is_empty() {
                let listing = format!("Received: {}", entries.join(", "));
                let wrap_width = usize::from(settings.max_width).saturating_sub(settings.padding);
                let wrapped = word_wrap(&listing, wrap_width.max(1));
                finished.push_str("\n\n");
                finished.push_str(&indent(&wrapped, settings.padding));
            }

            format!(
                "\n{pad}{finished}\n\n{pad}{bar}\n\n{pad}{hint}\n\n",
                pad = pad,
                finished = finished,
                bar = bar(model),
                hint = quit_hint(&settings.quit_keys),
            )
        }
        Phase::Error => model.error_message().unwrap_or_default().to_string(),
    }
}

fn bar(model: &ReceiverModel) -> String {
    progress_bar(model.progress(), usize::from(model.viewport_width()))
}

fn quit_hint(quit_keys: &[String]) -> String {
    format!("(any of [{}] to abort)", quit_keys.join(", "))
}

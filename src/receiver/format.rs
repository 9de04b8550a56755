//! Text helpers for the receiver view: sizes, progress bar, file summary,
//! wrapping.

use std::collections::HashMap;

const SI_UNIT: u64 = 1000;
const SI_PREFIXES: &[u8] = b"KMGTPE";

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Human-readable size in base-1000 units: `999 B`, `1.0 KB`, `1.0 MB`, ...
pub fn byte_count_si(bytes: u64) -> String {
    if bytes < SI_UNIT {
        return format!("{} B", bytes);
    }

    let mut div = SI_UNIT;
    let mut exp = 0;
    let mut n = bytes / SI_UNIT;
    while n >= SI_UNIT {
        div *= SI_UNIT;
        exp += 1;
        n /= SI_UNIT;
    }

    format!(
        "{:.1} {}B",
        bytes as f64 / div as f64,
        SI_PREFIXES[exp] as char
    )
}

/// Bar of `width` columns, the last five of which hold the percentage.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let percent = format!(" {:>3.0}%", fraction * 100.0);
    let cells = width.saturating_sub(percent.chars().count());
    let filled = ((cells as f64) * fraction).round() as usize;

    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(cells - filled));
    bar.push_str(&percent);
    bar
}

pub fn spinner_frame(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Collapse received paths to their top-level entries, sorted.
///
/// An entry that appears `n` times is labelled `name (n-1 subfiles)`; a
/// single occurrence is shown bare.
pub fn top_level_entries(files: &[String]) -> Vec<String> {
    let mut children: HashMap<&str, usize> = HashMap::new();
    for file in files {
        let top = file.split('/').next().unwrap_or(file.as_str());
        children
            .entry(top)
            .and_modify(|count| *count += 1)
            .or_insert(0);
    }

    let mut entries: Vec<String> = children
        .into_iter()
        .map(|(name, subfiles)| {
            if subfiles > 0 {
                format!("{} ({} subfiles)", name, subfiles)
            } else {
                name.to_string()
            }
        })
        .collect();
    entries.sort();
    entries
}

/// Greedy word wrap on spaces. Words longer than `width` keep their own line.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Prefix every line with `padding` spaces.
pub fn indent(lines: &[String], padding: usize) -> String {
    let pad = " ".repeat(padding);
    lines
        .iter()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

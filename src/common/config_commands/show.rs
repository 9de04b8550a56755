use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::common::config::ENV_PREFIX;

pub(super) fn write_path(path: &Path, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", path.display())?;
    Ok(())
}

/// Print the config file verbatim, or explain where settings come from when
/// there is no file yet.
pub(super) fn write_file_or_hint(
    path: &Path,
    out: &mut dyn Write,
    hint: &mut dyn Write,
) -> Result<()> {
    if !path.is_file() {
        writeln!(hint, "No config file at {}", path.display())?;
        writeln!(
            hint,
            "Running on built-in defaults and {}* environment variables (`portal config resolved` prints them)",
            ENV_PREFIX
        )?;
        return Ok(());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    write_resolved(&contents, out)
}

/// Write TOML text, terminated by exactly one trailing newline.
pub(super) fn write_resolved(text: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", text.trim_end_matches('\n'))?;
    Ok(())
}

//! `portal config` subcommands.

mod show;

use std::io;

use anyhow::{Context, Result};

use crate::common::config::{config_path, load_config};

pub fn run_config_path() -> Result<()> {
    show::write_path(&config_path(), &mut io::stdout().lock())
}

/// Print the config file as written; guidance goes to stderr when absent.
pub fn run_config_show() -> Result<()> {
    show::write_file_or_hint(
        &config_path(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Print the effective settings after defaults, file and environment merge.
pub fn run_config_resolved() -> Result<()> {
    let config = load_config()?;
    let text = toml::to_string_pretty(&config).context("Failed to render resolved config")?;
    show::write_resolved(&text, &mut io::stdout().lock())
}

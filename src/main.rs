use anyhow::Result;
use clap::{Parser, Subcommand};
use portal::common::config::{apply_overrides, load_config, ConfigOverrides};
use portal::common::config_commands;
use portal::server::{os_signals, LifecycleError, MailboxStore, ServerLifecycle};
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Rendezvous server for peer-to-peer file transfer")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rendezvous server until SIGINT/SIGTERM
    Serve {
        #[arg(long, help = "Port to listen on (default 6969)")]
        port: Option<u16>,
        #[arg(long, help = "Address to bind (default 0.0.0.0)")]
        bind: Option<IpAddr>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the config file as written
    Show,
    /// Print the merged config (defaults, file, environment)
    Resolved,
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn,portal=info",
        1 => "info,portal=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Serve { port, bind } => serve(ConfigOverrides { port, bind }).await,
        Commands::Config { command } => match command {
            ConfigCommand::Path => config_commands::run_config_path(),
            ConfigCommand::Show => config_commands::run_config_show(),
            ConfigCommand::Resolved => config_commands::run_config_resolved(),
        },
    };

    // Bind failures and shutdown timeouts end the process here
    if let Err(err) = result {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn serve(overrides: ConfigOverrides) -> Result<()> {
    let config = apply_overrides(load_config()?, &overrides);
    config.validate()?;

    let signals = os_signals().map_err(LifecycleError::Signal)?;
    let mailboxes = MailboxStore::new();
    let lifecycle = ServerLifecycle::new(config.server.options(), &mailboxes);

    let reason = lifecycle.start(signals).await?;
    tracing::debug!("Rendezvous server exited after {}", reason);
    Ok(())
}

//! # linuxcord
//!
//! **linuxcord** installs and updates Discord for the current user.
//!
//! Features:
//! - `linuxcord init` installs the latest client and a desktop entry
//! - `linuxcord update` installs a newer release if one is published
//! - `linuxcord run` updates when possible, then starts Discord
//! - `linuxcord status` shows installed and latest versions
//! - `linuxcord uninstall` removes everything linuxcord manages
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use linuxcord::{Overrides, cmd_init, cmd_run, cmd_status, cmd_uninstall, cmd_update};
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "linuxcord",
    version,
    about = "linuxcord - keep Discord up to date on Linux",
    arg_required_else_help = true
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Download URL for the Discord tarball
    #[arg(long, global = true, value_name = "URL")]
    download_url: Option<String>,

    /// URL of the updates metadata endpoint
    #[arg(long, global = true, value_name = "URL")]
    updates_url: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Install Discord and register the desktop entry
    Init {
        /// Reinstall even if already up to date
        #[arg(long)]
        force: bool,
    },
    /// Install the latest release if it differs from the installed one
    Update {
        /// Reinstall even if already up to date
        #[arg(long)]
        force: bool,
        /// Only report whether an update is available
        #[arg(long, conflicts_with = "force")]
        check: bool,
    },
    /// Update if possible, then launch Discord
    Run,
    /// Show installed and latest versions
    Status,
    /// Remove installed versions, caches and desktop entries
    Uninstall {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "linuxcord=debug" } else { "linuxcord=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = Overrides {
        download_url: cli.download_url,
        updates_url: cli.updates_url,
    };

    match cli.cmd {
        Cmd::Init { force } => cmd_init(&overrides, force),
        Cmd::Update { force, check } => cmd_update(&overrides, force, check),
        Cmd::Run => cmd_run(&overrides),
        Cmd::Status => cmd_status(&overrides),
        Cmd::Uninstall { yes } => cmd_uninstall(&overrides, yes),
    }
}

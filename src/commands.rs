use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use crate::desktop::DesktopEntry;
use crate::launcher::launch;
use crate::paths::Paths;
use crate::settings::{Overrides, Settings};
use crate::update::{UpdateOptions, UpdateOutcome, Updater, write_state};

fn updater(overrides: &Overrides) -> Result<Updater> {
    let settings = Settings::load(overrides)?;
    Updater::new(Paths::from_env(), settings).context("failed to set up HTTP client")
}

/// Human-readable summary of an outcome, one fact per line.
pub fn render_outcome(out: &UpdateOutcome) -> String {
    let installed = out
        .installed
        .as_ref()
        .map_or_else(|| "none".dimmed().to_string(), |v| v.to_string().green().to_string());
    let latest = out
        .latest
        .as_ref()
        .map_or_else(|| "unknown".yellow().to_string(), |v| v.to_string());
    let current = out
        .current_path
        .as_ref()
        .map_or_else(|| "none".dimmed().to_string(), |p| p.display().to_string());
    let updated = if out.updated { "yes".green() } else { "no".normal() };
    format!(
        "Installed version: {installed}\n\
         Latest online version: {latest}\n\
         Current install path: {current}\n\
         Updated: {updated}"
    )
}

fn print_outcome(out: &UpdateOutcome) {
    println!("{}", render_outcome(out));
}

fn save_state(up: &Updater, out: &UpdateOutcome) {
    if let Err(e) = write_state(up.paths(), out) {
        warn!("could not write state snapshot: {e}");
    }
}

/// First-time setup: directories, install, desktop entry.
pub fn cmd_init(overrides: &Overrides, force: bool) -> Result<()> {
    let up = updater(overrides)?;
    let out = up.update(UpdateOptions {
        force,
        check_only: false,
    })?;
    save_state(&up, &out);
    DesktopEntry::new(up.paths())
        .register()
        .context("failed to install desktop entry")?;
    print_outcome(&out);
    Ok(())
}

pub fn cmd_update(overrides: &Overrides, force: bool, check_only: bool) -> Result<()> {
    let up = updater(overrides)?;
    let out = up.update(UpdateOptions { force, check_only })?;
    save_state(&up, &out);
    print_outcome(&out);
    Ok(())
}

pub fn cmd_status(overrides: &Overrides) -> Result<()> {
    let up = updater(overrides)?;
    print_outcome(&up.status());
    Ok(())
}

/// Update if possible, then start whatever is current.
pub fn cmd_run(overrides: &Overrides) -> Result<()> {
    let up = updater(overrides)?;
    match up.update(UpdateOptions::default()) {
        Ok(out) => save_state(&up, &out),
        Err(e) => warn!("update failed, launching existing install: {e}"),
    }
    let child = launch(up.paths()).context("Discord is not installed; run `linuxcord init` first")?;
    info!(pid = child.id(), "Discord started");
    Ok(())
}

pub fn cmd_uninstall(overrides: &Overrides, yes: bool) -> Result<()> {
    if !yes && !confirm("Remove linuxcord data and desktop entries?")? {
        println!("Aborted");
        return Ok(());
    }
    updater(overrides)?.uninstall()?;
    println!("linuxcord files removed");
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

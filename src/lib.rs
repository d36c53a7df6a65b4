//! Crate entry point for **linuxcord**.
//!
//! This library keeps a per-user copy of the Discord Linux client up to
//! date under the XDG base directories. Each submodule owns one step of the
//! pipeline (resolve, download, extract, switch, prune); [`Updater`] runs
//! them under a file lock and the `cmd_*` functions back the CLI.
//!
//! The `pub use` re-exports below are the supported surface; everything
//! else is an implementation detail of the `linuxcord` binary.

mod commands;
mod desktop;
mod error;
mod install;
mod launcher;
mod local;
mod lock;
mod paths;
mod progress;
mod remote;
mod settings;
mod update;
mod version;

#[cfg(test)]
mod test_support;

pub use commands::{cmd_init, cmd_run, cmd_status, cmd_uninstall, cmd_update};
pub use error::{Error, ErrorKind, Result};
pub use install::Installer;
pub use paths::{BaseDirs, FixedDirs, Paths, XdgDirs};
pub use settings::{Overrides, Settings};
pub use update::{UpdateOptions, UpdateOutcome, Updater};
pub use version::Version;

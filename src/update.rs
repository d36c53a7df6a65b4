use reqwest::blocking::Client;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::desktop::DesktopEntry;
use crate::error::{Error, IoContext, Result};
use crate::install::{Installer, remove_path};
use crate::local::LocalInspector;
use crate::lock::UpdateLock;
use crate::paths::Paths;
use crate::remote::{RemoteResolver, http_client};
use crate::settings::Settings;
use crate::version::Version;

/// Result of an update or status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Installed version after the operation.
    pub installed: Option<Version>,
    /// Latest published version, if it could be determined.
    pub latest: Option<Version>,
    /// Whether something was actually installed.
    pub updated: bool,
    /// Resolved directory of the current install.
    pub current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Reinstall even when up to date.
    pub force: bool,
    /// Decide under the lock, but never install.
    pub check_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    /// Nothing known to install against.
    LatestUnknown,
    Install,
}

/// Whether an install is due, given what is installed and what is
/// published.
pub fn decide(installed: Option<&Version>, latest: Option<&Version>, force: bool) -> Decision {
    if force {
        return Decision::Install;
    }
    let needs_install = installed.is_none();
    let needs_update = latest.is_some() && latest != installed;
    if !needs_install && !needs_update {
        return Decision::UpToDate;
    }
    if latest.is_none() {
        return Decision::LatestUnknown;
    }
    Decision::Install
}

/// Coordinates one update: lock, inspect, resolve, install, switch, prune.
pub struct Updater {
    paths: Paths,
    settings: Settings,
    client: Client,
}

impl Updater {
    pub fn new(paths: Paths, settings: Settings) -> Result<Self> {
        Ok(Self::with_client(paths, settings, http_client()?))
    }

    pub fn with_client(paths: Paths, settings: Settings, client: Client) -> Self {
        Self {
            paths,
            settings,
            client,
        }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    fn resolver(&self) -> RemoteResolver {
        RemoteResolver::new(
            self.client.clone(),
            &self.settings.download_url,
            &self.settings.updates_url,
        )
    }

    fn outcome(&self, installed: Option<Version>, latest: Option<Version>, updated: bool) -> UpdateOutcome {
        UpdateOutcome {
            installed,
            latest,
            updated,
            current_path: LocalInspector::new(&self.paths).current_install(),
        }
    }

    /// Bring the install up to date.
    ///
    /// Runs entirely under the update lock; a second caller blocks until
    /// this one finishes and then re-evaluates from scratch. Failures are
    /// returned as-is, the lock is released either way, and the previous
    /// `current` pointer stays in place unless the new version installed
    /// completely.
    pub fn update(&self, opts: UpdateOptions) -> Result<UpdateOutcome> {
        self.paths.ensure_base_dirs()?;
        let _lock = UpdateLock::acquire(&self.paths.lock_file())?;

        let installed = LocalInspector::new(&self.paths).current_version();
        let remote = self.resolver();
        let latest = remote.latest_version();
        info!(
            installed = %display_or(&installed, "none"),
            latest = %display_or(&latest, "unknown"),
            "resolved versions"
        );

        match decide(installed.as_ref(), latest.as_ref(), opts.force) {
            Decision::UpToDate => {
                debug!("installed version is the latest");
                return Ok(self.outcome(installed, latest, false));
            }
            Decision::LatestUnknown => {
                debug!("latest version unknown; not installing without force");
                return Ok(self.outcome(installed, latest, false));
            }
            Decision::Install if opts.check_only => {
                debug!("check only; not installing");
                return Ok(self.outcome(installed, latest, false));
            }
            Decision::Install => {}
        }

        let target = latest.clone().ok_or(Error::UnknownLatest)?;
        let installer = Installer::new(self.paths.clone(), self.client.clone());
        let dest = self.paths.install(&target);

        if !opts.force && is_complete_install(&self.paths, &target) {
            info!(path = %dest.dir().display(), "reusing existing install");
        } else {
            // A leftover directory (failed install kept for diagnosis,
            // retained old version) is replaced rather than blocking.
            let overwrite = opts.force || fs::symlink_metadata(dest.dir()).is_ok();
            let url = remote.latest_download_url()?;
            installer.install(&target, &url, overwrite)?;
        }

        installer.link_current(&target)?;
        if let Err(e) = DesktopEntry::new(&self.paths).register() {
            warn!("desktop integration failed: {e}");
        }
        installer.prune_old_versions(&target)?;

        Ok(self.outcome(Some(target), latest, true))
    }

    /// Installed and latest versions without taking the lock or touching
    /// disk. May race an update in progress and see the previous state.
    pub fn status(&self) -> UpdateOutcome {
        let installed = LocalInspector::new(&self.paths).current_version();
        let latest = self.resolver().latest_version();
        self.outcome(installed, latest, false)
    }

    /// Remove the desktop entry and every managed directory.
    pub fn uninstall(&self) -> Result<()> {
        let _lock = UpdateLock::acquire(&self.paths.lock_file())?;
        DesktopEntry::new(&self.paths).unregister()?;
        for dir in [
            self.paths.versions_dir(),
            self.paths.cache.clone(),
            self.paths.data.clone(),
            self.paths.state.clone(),
        ] {
            debug!(path = %dir.display(), "removing");
            if let Err(e) = remove_path(&dir) {
                warn!("{e}");
            }
        }
        info!("uninstalled linuxcord-managed files");
        Ok(())
    }
}

fn is_complete_install(paths: &Paths, version: &Version) -> bool {
    let ip = paths.install(version);
    ip.required_files().iter().all(|f| f.is_file())
        && LocalInspector::version_at(ip.dir()).as_ref() == Some(version)
}

fn display_or(v: &Option<Version>, fallback: &str) -> String {
    v.as_ref().map_or_else(|| fallback.to_string(), |v| v.to_string())
}

#[derive(Debug, Serialize)]
struct StateSnapshot {
    installed_version: Option<String>,
    latest_version: Option<String>,
}

/// Write `<state>/state.json`.
pub fn write_state(paths: &Paths, outcome: &UpdateOutcome) -> Result<()> {
    let snapshot = StateSnapshot {
        installed_version: outcome.installed.as_ref().map(|v| v.to_string()),
        latest_version: outcome.latest.as_ref().map(|v| v.to_string()),
    };
    let path = paths.state_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    let body = serde_json::to_string_pretty(&snapshot)
        .map_err(std::io::Error::other)
        .at(&path)?;
    debug!(path = %path.display(), "writing state");
    fs::write(&path, body).at(&path)
}

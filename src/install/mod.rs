mod archive;
mod download;

use reqwest::blocking::Client;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, IoContext, Result};
use crate::paths::{InstallPaths, Paths};
use crate::version::Version;

use archive::{safe_extract, single_top_dir};
use download::download_to_temp;

/// Downloads, validates and places versions under `<data>/versions`, and
/// maintains the `current` pointer among them.
///
/// Callers are expected to hold the update lock around every
/// mutating method.
pub struct Installer {
    paths: Paths,
    client: Client,
}

impl Installer {
    pub fn new(paths: Paths, client: Client) -> Self {
        Self { paths, client }
    }

    /// Install `version` from the archive at `url`.
    ///
    /// Process:
    /// 1. Refuse an existing destination unless `force`, in which case it
    ///    is removed. No request is made when refusing.
    /// 2. Stream the archive into a temporary file under the cache dir.
    /// 3. Hand over to [`Installer::install_archive`].
    pub fn install(&self, version: &Version, url: &str, force: bool) -> Result<InstallPaths> {
        let target = self.prepare_destination(version, force)?;
        fs::create_dir_all(&self.paths.cache).at(&self.paths.cache)?;
        let tarball = download_to_temp(&self.client, url, &self.paths.cache)?;
        self.place(version, tarball.path(), target)
    }

    /// Install `version` from an archive already on disk.
    pub fn install_archive(
        &self,
        version: &Version,
        archive: &Path,
        force: bool,
    ) -> Result<InstallPaths> {
        let target = self.prepare_destination(version, force)?;
        self.place(version, archive, target)
    }

    fn prepare_destination(&self, version: &Version, force: bool) -> Result<InstallPaths> {
        let target = self.paths.install(version);
        let dest = target.dir();
        if fs::symlink_metadata(dest).is_ok() {
            if !force {
                return Err(Error::AlreadyExists {
                    path: dest.to_path_buf(),
                });
            }
            info!(path = %dest.display(), "removing existing install (forced)");
            remove_path(dest)?;
        }
        let versions = self.paths.versions_dir();
        fs::create_dir_all(&versions).at(&versions)?;
        Ok(target)
    }

    /// Extract into a scratch dir next to the destination, move the
    /// top-level directory into place, then verify it.
    ///
    /// The scratch dir lives in `versions/` so the move is a rename on the
    /// same filesystem; it is removed on every exit path.
    fn place(&self, version: &Version, archive: &Path, target: InstallPaths) -> Result<InstallPaths> {
        let versions = self.paths.versions_dir();
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&versions)
            .at(&versions)?;

        safe_extract(archive, staging.path())?;
        let top = single_top_dir(staging.path())?;
        debug!(from = %top.display(), to = %target.dir().display(), "moving extracted tree");
        fs::rename(&top, target.dir()).at(target.dir())?;
        drop(staging);

        for required in target.required_files() {
            if !required.exists() {
                return Err(Error::NotFound { path: required });
            }
        }

        let found = Version::from_manifest(&target.manifest())?;
        if &found != version {
            return Err(Error::VersionMismatch {
                expected: version.to_string(),
                found: found.to_string(),
            });
        }

        self.copy_icon(&target);
        info!(%version, path = %target.dir().display(), "installed");
        Ok(target)
    }

    fn copy_icon(&self, target: &InstallPaths) {
        let icon = target.icon();
        let shared = self.paths.shared_icon();
        match fs::copy(&icon, &shared) {
            Ok(_) => debug!(from = %icon.display(), to = %shared.display(), "copied icon"),
            Err(e) => warn!(
                icon = %icon.display(),
                "could not copy icon, desktop entry may lack one: {e}"
            ),
        }
    }

    /// Point `versions/current` at `version`'s install directory.
    ///
    /// A new link is created beside the old one and renamed over it, so
    /// readers see either the previous target or the new one.
    pub fn link_current(&self, version: &Version) -> Result<()> {
        let target = self.paths.install(version);
        let link = self.paths.current_link();
        let versions = self.paths.versions_dir();
        fs::create_dir_all(&versions).at(&versions)?;

        if let Ok(meta) = fs::symlink_metadata(&link)
            && meta.is_dir()
        {
            debug!(path = %link.display(), "replacing non-link current directory");
            fs::remove_dir_all(&link).at(&link)?;
        }

        let tmp = versions.join(format!(".current-{}", std::process::id()));
        remove_path(&tmp)?;
        symlink(target.dir(), &tmp).at(&tmp)?;
        fs::rename(&tmp, &link).at(&link)?;
        info!(target = %target.dir().display(), "linked current install");
        Ok(())
    }

    /// Delete every installed version except `current`.
    ///
    /// Skipped entirely when `versions/NO_PRUNING` exists. Only real
    /// directories are candidates; the `current` link and marker files
    /// are left alone. Deletion is best effort: a failed removal is
    /// logged and the rest still go.
    pub fn prune_old_versions(&self, current: &Version) -> Result<Vec<PathBuf>> {
        let marker = self.paths.no_pruning_marker();
        if marker.exists() {
            info!(marker = %marker.display(), "pruning disabled");
            return Ok(Vec::new());
        }

        let keep_dir = self.paths.install(current);
        let keep = match fs::canonicalize(keep_dir.dir()) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %keep_dir.dir().display(), "current version missing, not pruning: {e}");
                return Ok(Vec::new());
            }
        };

        let versions = self.paths.versions_dir();
        let rd = match fs::read_dir(&versions) {
            Ok(rd) => rd,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).at(&versions),
        };

        let mut removed = Vec::new();
        for ent in rd.flatten() {
            let is_dir = ent.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let path = ent.path();
            if fs::canonicalize(&path).map(|p| p == keep).unwrap_or(false) {
                continue;
            }
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "pruned old version");
                    removed.push(path);
                }
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "failed to prune: {e}"),
            }
        }
        removed.sort();
        Ok(removed)
    }
}

/// Remove a file, link or directory tree; a missing path is fine.
pub(crate) fn remove_path(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).at(path),
    };
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Err(e) if e.kind() != IoErrorKind::NotFound => Err(e).at(path),
        _ => Ok(()),
    }
}

#[cfg(unix)]
pub(crate) fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(not(unix))]
pub(crate) fn symlink(_src: &Path, _dst: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        IoErrorKind::Unsupported,
        "symlinks are only supported on unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::paths::FixedDirs;
    use crate::remote::http_client;
    use crate::test_support::{TarballBuilder, write_archive};
    use httpmock::prelude::*;
    use tempfile::{TempDir, tempdir};

    fn setup() -> (TempDir, Paths, Installer) {
        let td = tempdir().unwrap();
        let paths = Paths::new(&FixedDirs::new(td.path()));
        paths.ensure_base_dirs().unwrap();
        let installer = Installer::new(paths.clone(), http_client().unwrap());
        (td, paths, installer)
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn serve<'a>(server: &'a MockServer, path: &str, bytes: Vec<u8>) -> httpmock::Mock<'a> {
        let path = path.to_string();
        server.mock(move |when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).body(bytes.clone());
        })
    }

    #[test]
    fn install_places_verified_tree() {
        let (_td, paths, installer) = setup();
        let server = MockServer::start();
        let m = serve(&server, "/discord-1.2.3.tar.gz", TarballBuilder::discord("1.2.3").finish());

        let ip = installer
            .install(&v("1.2.3"), &server.url("/discord-1.2.3.tar.gz"), false)
            .unwrap();
        m.assert();

        assert_eq!(ip.dir(), paths.versions_dir().join("1.2.3"));
        for f in ip.required_files() {
            assert!(f.is_file(), "{}", f.display());
        }
        assert_eq!(fs::read(paths.shared_icon()).unwrap(), b"icon");
        // nothing left behind in staging or cache
        let leftovers: Vec<_> = fs::read_dir(paths.versions_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("1.2.3")]);
        assert_eq!(fs::read_dir(&paths.cache).unwrap().count(), 0);
    }

    #[test]
    fn version_mismatch_fails_without_linking() {
        let (_td, paths, installer) = setup();
        let server = MockServer::start();
        let bytes = TarballBuilder::new().discord_tree("9.9.9", true).finish();
        serve(&server, "/discord.tar.gz", bytes);

        let err = installer
            .install(&v("1.2.3"), &server.url("/discord.tar.gz"), false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionMismatch);
        assert!(fs::symlink_metadata(paths.current_link()).is_err());
    }

    #[test]
    fn existing_destination_without_force_makes_no_request() {
        let (_td, paths, installer) = setup();
        let server = MockServer::start();
        let m = serve(&server, "/discord.tar.gz", TarballBuilder::discord("1.2.3").finish());
        fs::create_dir_all(paths.versions_dir().join("1.2.3")).unwrap();

        let err = installer
            .install(&v("1.2.3"), &server.url("/discord.tar.gz"), false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(m.hits(), 0);
    }

    #[test]
    fn force_overwrites_and_drops_stale_files() {
        let (_td, paths, installer) = setup();
        let server = MockServer::start();
        serve(&server, "/discord.tar.gz", TarballBuilder::discord("1.2.3").finish());
        let dest = paths.versions_dir().join("1.2.3");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.txt"), "old").unwrap();

        installer
            .install(&v("1.2.3"), &server.url("/discord.tar.gz"), true)
            .unwrap();
        assert!(!dest.join("stale.txt").exists());
        assert!(dest.join("Discord").is_file());
    }

    #[test]
    fn missing_icon_is_not_found_and_left_for_diagnosis() {
        let (td, paths, installer) = setup();
        let bytes = TarballBuilder::new().discord_tree("1.2.3", false).finish();
        let archive = write_archive(td.path(), &bytes);

        let err = installer.install_archive(&v("1.2.3"), &archive, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(paths.versions_dir().join("1.2.3/Discord").is_file());
    }

    #[test]
    fn traversal_archive_leaves_no_install() {
        let (td, paths, installer) = setup();
        let bytes = TarballBuilder::discord("1.2.3")
            .raw_entry("Discord/../../outside", b"x")
            .finish();
        let archive = write_archive(td.path(), &bytes);

        let err = installer.install_archive(&v("1.2.3"), &archive, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathTraversal);
        assert!(!paths.versions_dir().join("1.2.3").exists());
        assert_eq!(fs::read_dir(paths.versions_dir()).unwrap().count(), 0);
    }

    #[test]
    fn archive_without_top_dir_is_missing_content() {
        let (td, _paths, installer) = setup();
        let bytes = TarballBuilder::new().file("Discord", b"bin", 0o755).finish();
        let archive = write_archive(td.path(), &bytes);

        let err = installer.install_archive(&v("1.2.3"), &archive, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingContent);
    }

    #[test]
    fn link_current_switches_target() {
        let (_td, paths, installer) = setup();
        let a = paths.versions_dir().join("1.0.0");
        let b = paths.versions_dir().join("2.0.0");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();

        installer.link_current(&v("1.0.0")).unwrap();
        assert_eq!(fs::read_link(paths.current_link()).unwrap(), a);
        installer.link_current(&v("2.0.0")).unwrap();
        assert_eq!(fs::read_link(paths.current_link()).unwrap(), b);

        let names: Vec<_> = fs::read_dir(paths.versions_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".current-"))
            .collect();
        assert!(names.is_empty());
    }

    #[test]
    fn link_current_replaces_plain_file() {
        let (_td, paths, installer) = setup();
        fs::create_dir_all(paths.versions_dir().join("1.0.0")).unwrap();
        fs::write(paths.current_link(), "junk").unwrap();

        installer.link_current(&v("1.0.0")).unwrap();
        assert!(paths.current_link().join(".").is_dir());
    }

    #[test]
    fn prune_removes_everything_but_current() {
        let (_td, paths, installer) = setup();
        let current = paths.versions_dir().join("11.0.0");
        let old = paths.versions_dir().join("10.0.0");
        let leftover = paths.versions_dir().join(".staging-abc");
        for d in [&current, &old, &leftover] {
            fs::create_dir_all(d).unwrap();
        }
        installer.link_current(&v("11.0.0")).unwrap();

        let removed = installer.prune_old_versions(&v("11.0.0")).unwrap();
        assert_eq!(removed, vec![leftover.clone(), old.clone()]);
        assert!(current.is_dir());
        assert!(!old.exists());
        assert!(paths.current_link().exists());
    }

    #[test]
    fn prune_respects_marker() {
        let (_td, paths, installer) = setup();
        let current = paths.versions_dir().join("12.0.0");
        let old = paths.versions_dir().join("12.0.1");
        fs::create_dir_all(&current).unwrap();
        fs::create_dir_all(&old).unwrap();
        installer.link_current(&v("12.0.0")).unwrap();
        fs::write(paths.no_pruning_marker(), "").unwrap();

        assert!(installer.prune_old_versions(&v("12.0.0")).unwrap().is_empty());
        assert!(current.exists());
        assert!(old.exists());
        assert!(paths.no_pruning_marker().exists());
    }

    #[test]
    fn prune_without_current_dir_keeps_everything() {
        let (_td, paths, installer) = setup();
        let old = paths.versions_dir().join("1.0.0");
        fs::create_dir_all(&old).unwrap();

        assert!(installer.prune_old_versions(&v("2.0.0")).unwrap().is_empty());
        assert!(old.exists());
    }
}

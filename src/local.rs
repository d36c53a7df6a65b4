use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::paths::{InstallPaths, Paths};
use crate::version::Version;

/// Read-only view of what is installed locally.
///
/// Never fails: a missing, dangling or unreadable install reports as
/// "not installed".
pub struct LocalInspector<'a> {
    paths: &'a Paths,
}

impl<'a> LocalInspector<'a> {
    pub fn new(paths: &'a Paths) -> Self {
        Self { paths }
    }

    /// Resolved target of `versions/current`, if it points at a directory.
    pub fn current_install(&self) -> Option<PathBuf> {
        let link = self.paths.current_link();
        match fs::canonicalize(&link) {
            Ok(p) if p.is_dir() => {
                debug!(path = %p.display(), "resolved current install");
                Some(p)
            }
            Ok(p) => {
                debug!(path = %p.display(), "current install is not a directory");
                None
            }
            Err(e) => {
                debug!(link = %link.display(), "no current install: {e}");
                None
            }
        }
    }

    /// Version recorded in the manifest of the current install.
    pub fn current_version(&self) -> Option<Version> {
        self.current_install().and_then(|dir| Self::version_at(&dir))
    }

    /// Version recorded in the manifest of the install at `dir`.
    pub fn version_at(dir: &Path) -> Option<Version> {
        let manifest = InstallPaths::new(dir).manifest();
        match Version::from_manifest(&manifest) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("unreadable manifest: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::FixedDirs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn install_fake(paths: &Paths, name: &str, manifest: &str) -> PathBuf {
        let dir = paths.versions_dir().join(name);
        fs::create_dir_all(dir.join("resources")).unwrap();
        fs::write(dir.join("resources/build_info.json"), manifest).unwrap();
        dir
    }

    #[test]
    fn nothing_installed() {
        let td = tempdir().unwrap();
        let paths = Paths::new(&FixedDirs::new(td.path()));
        let local = LocalInspector::new(&paths);
        assert!(local.current_install().is_none());
        assert!(local.current_version().is_none());
    }

    #[test]
    fn reads_version_through_current_link() {
        let td = tempdir().unwrap();
        let paths = Paths::new(&FixedDirs::new(td.path()));
        let dir = install_fake(&paths, "0.0.76", r#"{"version": "0.0.76"}"#);
        symlink(&dir, paths.current_link()).unwrap();

        let local = LocalInspector::new(&paths);
        assert_eq!(local.current_install().unwrap(), fs::canonicalize(&dir).unwrap());
        assert_eq!(local.current_version().unwrap().to_string(), "0.0.76");
    }

    #[test]
    fn dangling_link_is_not_installed() {
        let td = tempdir().unwrap();
        let paths = Paths::new(&FixedDirs::new(td.path()));
        fs::create_dir_all(paths.versions_dir()).unwrap();
        symlink(paths.versions_dir().join("gone"), paths.current_link()).unwrap();

        let local = LocalInspector::new(&paths);
        assert!(local.current_install().is_none());
        assert!(local.current_version().is_none());
    }

    #[test]
    fn corrupt_manifest_is_not_installed() {
        let td = tempdir().unwrap();
        let paths = Paths::new(&FixedDirs::new(td.path()));
        let dir = install_fake(&paths, "0.0.76", "{broken");
        symlink(&dir, paths.current_link()).unwrap();

        let local = LocalInspector::new(&paths);
        assert!(local.current_install().is_some());
        assert!(local.current_version().is_none());
    }
}

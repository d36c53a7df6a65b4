//! On-disk layout.
//!
//! ```text
//! <data>/versions/<version>/                install directory
//! <data>/versions/<version>/Discord         executable
//! <data>/versions/<version>/icon.png        icon
//! <data>/versions/<version>/resources/build_info.json
//! <data>/versions/current                   symlink to the active install
//! <data>/versions/NO_PRUNING                operator-managed opt-out
//! <data>/discord.png                        icon copy for the desktop entry
//! <cache>/                                  download staging
//! <state>/state.json                        status snapshot
//! <runtime-or-state>/linuxcord.lock         update lock
//! ```
//!
//! Everything here is a pure function of a [`BaseDirs`] implementation,
//! except [`Paths::ensure_base_dirs`].

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::{IoContext, Result};
use crate::version::Version;

pub const APP_NAME: &str = "linuxcord";

const EXECUTABLE: &str = "Discord";
const ICON: &str = "icon.png";
const MANIFEST: &str = "resources/build_info.json";

/// Source of the XDG base directories.
///
/// Production uses [`XdgDirs`]; tests use [`FixedDirs`] so nothing leaks
/// into the real home directory.
pub trait BaseDirs {
    fn data_home(&self) -> PathBuf;
    fn cache_home(&self) -> PathBuf;
    fn state_home(&self) -> PathBuf;
    fn runtime_dir(&self) -> Option<PathBuf>;

    /// `<data_home>/<name>`, e.g. the `applications` directory.
    fn data_subpath(&self, name: &str) -> PathBuf {
        self.data_home().join(name)
    }
}

/// Base directories read from the `XDG_*` environment variables.
#[derive(Debug, Clone)]
pub struct XdgDirs {
    data: PathBuf,
    cache: PathBuf,
    state: PathBuf,
    runtime: Option<PathBuf>,
}

impl XdgDirs {
    pub fn from_env() -> Self {
        let home = PathBuf::from(env::var_os("HOME").unwrap_or_default());
        let var = |key: &str| {
            env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            data: var("XDG_DATA_HOME").unwrap_or_else(|| home.join(".local/share")),
            cache: var("XDG_CACHE_HOME").unwrap_or_else(|| home.join(".cache")),
            state: var("XDG_STATE_HOME").unwrap_or_else(|| home.join(".local/state")),
            runtime: var("XDG_RUNTIME_DIR"),
        }
    }
}

impl BaseDirs for XdgDirs {
    fn data_home(&self) -> PathBuf {
        self.data.clone()
    }

    fn cache_home(&self) -> PathBuf {
        self.cache.clone()
    }

    fn state_home(&self) -> PathBuf {
        self.state.clone()
    }

    fn runtime_dir(&self) -> Option<PathBuf> {
        self.runtime.clone()
    }
}

/// Every base directory under one root: `<root>/data`, `<root>/cache`,
/// `<root>/state`, and optionally `<root>/runtime`.
#[derive(Debug, Clone)]
pub struct FixedDirs {
    root: PathBuf,
    with_runtime: bool,
}

impl FixedDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            with_runtime: false,
        }
    }

    pub fn with_runtime(mut self) -> Self {
        self.with_runtime = true;
        self
    }
}

impl BaseDirs for FixedDirs {
    fn data_home(&self) -> PathBuf {
        self.root.join("data")
    }

    fn cache_home(&self) -> PathBuf {
        self.root.join("cache")
    }

    fn state_home(&self) -> PathBuf {
        self.root.join("state")
    }

    fn runtime_dir(&self) -> Option<PathBuf> {
        self.with_runtime.then(|| self.root.join("runtime"))
    }
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub data: PathBuf,
    pub cache: PathBuf,
    pub state: PathBuf,
    pub runtime: Option<PathBuf>,
    pub applications: PathBuf,
}

impl Paths {
    pub fn new(dirs: &dyn BaseDirs) -> Self {
        Self {
            data: dirs.data_home().join(APP_NAME),
            cache: dirs.cache_home().join(APP_NAME),
            state: dirs.state_home().join(APP_NAME),
            runtime: dirs.runtime_dir(),
            applications: dirs.data_subpath("applications"),
        }
    }

    pub fn from_env() -> Self {
        Self::new(&XdgDirs::from_env())
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data.join("versions")
    }

    pub fn current_link(&self) -> PathBuf {
        self.versions_dir().join("current")
    }

    pub fn no_pruning_marker(&self) -> PathBuf {
        self.versions_dir().join("NO_PRUNING")
    }

    pub fn lock_file(&self) -> PathBuf {
        let dir = self.runtime.as_deref().unwrap_or(&self.state);
        dir.join(format!("{APP_NAME}.lock"))
    }

    pub fn state_file(&self) -> PathBuf {
        self.state.join("state.json")
    }

    pub fn shared_icon(&self) -> PathBuf {
        self.data.join("discord.png")
    }

    pub fn desktop_entry(&self) -> PathBuf {
        self.data.join(format!("{APP_NAME}.desktop"))
    }

    pub fn desktop_link(&self) -> PathBuf {
        self.applications.join(format!("{APP_NAME}.desktop"))
    }

    pub fn install(&self, version: &Version) -> InstallPaths {
        InstallPaths::new(self.versions_dir().join(version.to_string()))
    }

    /// Create data, cache, state and versions directories (`mkdir -p`).
    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [&self.data, &self.cache, &self.state, &self.versions_dir()] {
            fs::create_dir_all(dir).at(dir)?;
        }
        Ok(())
    }
}

/// Paths inside one installation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    dir: PathBuf,
}

impl InstallPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn executable(&self) -> PathBuf {
        self.dir.join(EXECUTABLE)
    }

    pub fn icon(&self) -> PathBuf {
        self.dir.join(ICON)
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST)
    }

    /// Files that must exist for an installation to be usable.
    pub fn required_files(&self) -> [PathBuf; 3] {
        [self.executable(), self.icon(), self.manifest()]
    }
}

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Error, IoContext, Result};
use crate::install::{remove_path, symlink};
use crate::paths::Paths;

pub const DESKTOP_NAME: &str = "Linuxcord (Discord)";

/// freedesktop.org menu entry for the managed install.
pub struct DesktopEntry<'a> {
    paths: &'a Paths,
}

impl<'a> DesktopEntry<'a> {
    pub fn new(paths: &'a Paths) -> Self {
        Self { paths }
    }

    pub fn render(&self) -> String {
        let icon = self.paths.shared_icon();
        format!(
            "[Desktop Entry]\n\
             Version=1.0\n\
             Type=Application\n\
             Name={DESKTOP_NAME}\n\
             Exec=linuxcord run\n\
             Terminal=false\n\
             Categories=Network;InstantMessaging;\n\
             StartupWMClass=discord\n\
             Icon={}\n",
            icon.display()
        )
    }

    /// Write `<data>/linuxcord.desktop` and link it into the user's
    /// applications directory.
    pub fn register(&self) -> Result<PathBuf> {
        let entry = self.paths.desktop_entry();
        if let Some(parent) = entry.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        debug!(path = %entry.display(), "writing desktop entry");
        fs::write(&entry, self.render()).at(&entry)?;

        let link = self.paths.desktop_link();
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        remove_path(&link)?;
        if !entry.exists() {
            return Err(Error::NotFound { path: entry });
        }
        debug!(from = %link.display(), to = %entry.display(), "linking desktop entry");
        symlink(&entry, &link).at(&link)?;
        Ok(link)
    }

    /// Remove the entry and its link; missing files are fine.
    pub fn unregister(&self) -> Result<()> {
        remove_path(&self.paths.desktop_link())?;
        remove_path(&self.paths.desktop_entry())
    }
}

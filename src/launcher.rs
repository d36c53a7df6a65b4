use std::process::{Child, Command, Stdio};
use tracing::info;

use crate::error::{Error, IoContext, Result};
use crate::local::LocalInspector;
use crate::paths::{InstallPaths, Paths};

/// Start the current install's executable in the background.
///
/// The child runs in the install directory and inherits the environment;
/// it is not waited on.
pub fn launch(paths: &Paths) -> Result<Child> {
    let current = LocalInspector::new(paths)
        .current_install()
        .ok_or_else(|| Error::NotFound {
            path: paths.current_link(),
        })?;
    let install = InstallPaths::new(&current);
    let exe = install.executable();
    if !exe.is_file() {
        return Err(Error::NotFound { path: exe });
    }

    info!(path = %exe.display(), "launching");
    Command::new(&exe)
        .current_dir(install.dir())
        .stdin(Stdio::null())
        .spawn()
        .at(&exe)
}

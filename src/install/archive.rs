use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;

use crate::error::{Error, IoContext, Result};

fn open(archive: &Path) -> Result<Archive<GzDecoder<File>>> {
    let f = File::open(archive).at(archive)?;
    Ok(Archive::new(GzDecoder::new(f)))
}

/// An entry name is unsafe if it is absolute or has a `..` segment.
fn check_entry_name(raw: &[u8]) -> Result<()> {
    let unsafe_name =
        raw.starts_with(b"/") || raw.split(|b| *b == b'/').any(|seg| seg == b"..");
    if unsafe_name {
        return Err(Error::PathTraversal {
            entry: String::from_utf8_lossy(raw).into_owned(),
        });
    }
    Ok(())
}

/// Walk every entry of a `.tar.gz` and reject unsafe names.
///
/// Nothing is written to disk; returns the number of entries checked.
pub fn validate_entries(archive: &Path) -> Result<usize> {
    let mut ar = open(archive)?;
    let mut count = 0;
    for entry in ar.entries().at(archive)? {
        let e = entry.at(archive)?;
        check_entry_name(&e.path_bytes())?;
        count += 1;
    }
    Ok(count)
}

/// Extract `archive` into `dest`, but only after every entry has been
/// validated. The archive is read twice so an unsafe entry anywhere in it
/// stops extraction before the first byte is written.
pub fn safe_extract(archive: &Path, dest: &Path) -> Result<()> {
    let n = validate_entries(archive)?;
    debug!(entries = n, dest = %dest.display(), "extracting archive");
    fs::create_dir_all(dest).at(dest)?;
    open(archive)?.unpack(dest).at(dest)
}

/// The single top-level directory of an extracted tree.
pub fn single_top_dir(root: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(root)
        .at(root)?
        .collect::<std::io::Result<Vec<_>>>()
        .at(root)?;
    if entries.len() != 1 {
        return Err(Error::MissingContent);
    }
    let only = entries.remove(0);
    match only.file_type() {
        Ok(ft) if ft.is_dir() => Ok(only.path()),
        _ => Err(Error::MissingContent),
    }
}

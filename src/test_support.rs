//! Helpers shared by the unit tests: in-memory `.tar.gz` archives shaped
//! like the upstream Discord tarball.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};

pub struct TarballBuilder {
    inner: Builder<GzEncoder<Vec<u8>>>,
}

impl TarballBuilder {
    pub fn new() -> Self {
        Self {
            inner: Builder::new(GzEncoder::new(Vec::new(), Compression::default())),
        }
    }

    /// A complete `Discord/` tree whose manifest declares `version`.
    pub fn discord(version: &str) -> Self {
        Self::new().discord_tree(version, true)
    }

    pub fn discord_tree(self, manifest_version: &str, with_icon: bool) -> Self {
        let manifest = format!(r#"{{"releaseChannel": "stable", "version": "{manifest_version}"}}"#);
        let b = self
            .file("Discord/Discord", b"#!/bin/sh\necho discord\n", 0o755)
            .file("Discord/resources/build_info.json", manifest.as_bytes(), 0o644);
        if with_icon {
            b.file("Discord/icon.png", b"icon", 0o644)
        } else {
            b
        }
    }

    pub fn file(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut h = Header::new_gnu();
        h.set_size(data.len() as u64);
        h.set_mode(mode);
        h.set_entry_type(EntryType::Regular);
        self.inner.append_data(&mut h, path, data).unwrap();
        self
    }

    /// Append an entry with an unchecked name; `append_data` refuses
    /// absolute and `..` paths, so the header bytes are filled by hand.
    pub fn raw_entry(mut self, name: &str, data: &[u8]) -> Self {
        let mut h = Header::new_old();
        let bytes = name.as_bytes();
        h.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
        h.set_size(data.len() as u64);
        h.set_mode(0o644);
        h.set_entry_type(EntryType::Regular);
        h.set_cksum();
        self.inner.append(&h, data).unwrap();
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.inner.into_inner().unwrap().finish().unwrap()
    }
}

impl Default for TarballBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
    let p = dir.join("archive.tar.gz");
    fs::write(&p, bytes).unwrap();
    p
}

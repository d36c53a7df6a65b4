use serde::Deserialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::error::{Error, IoContext, Result};

/// A semantic version, ordered by semver precedence.
///
/// Build metadata (`+...`) is kept for display but ignored by equality,
/// ordering and hashing, so `1.2.3+a == 1.2.3+b`.
#[derive(Debug, Clone)]
pub struct Version(semver::Version);

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_precedence(&other.0)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let v = &self.0;
        (v.major, v.minor, v.patch, v.pre.as_str()).hash(state);
    }
}

impl Version {
    pub fn parse(input: &str) -> Result<Self> {
        semver::Version::parse(input.trim())
            .map(Self)
            .map_err(|source| Error::Parse {
                input: input.to_string(),
                source,
            })
    }

    /// Read the `version` field of a `build_info.json` manifest.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path).at(path)?;
        let manifest = Manifest::from_json(&txt).map_err(|message| Error::Format {
            path: path.to_path_buf(),
            message,
        })?;
        Self::parse(&manifest.version)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shape of `resources/build_info.json`. Other keys are ignored.
#[derive(Debug, Deserialize)]
struct Manifest {
    version: String,
}

impl Manifest {
    fn from_json(txt: &str) -> std::result::Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(txt).map_err(|e| e.to_string())?;
        if !value.is_object() {
            return Err("top-level value is not an object".to_string());
        }
        serde_json::from_value(value).map_err(|_| "`version` is missing or not a string".to_string())
    }
}

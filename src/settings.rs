use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, io::ErrorKind, path::PathBuf};
use tracing::debug;

use crate::paths::APP_NAME;

pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://discord.com/api/download?platform=linux&format=tar.gz";
pub const DEFAULT_UPDATES_URL: &str = "https://discord.com/api/updates/stable?platform=linux";

pub const DOWNLOAD_URL_ENV: &str = "LINUXCORD_DISCORD_TGZ_URL";
pub const UPDATES_URL_ENV: &str = "LINUXCORD_UPDATES_URL";

/// Optional `config.toml`.
///
/// Example:
/// ```toml
/// download_url = "https://dl.example.com/discord.tar.gz"
/// updates_url  = "https://dl.example.com/updates.json"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub updates_url: Option<String>,
}

/// Endpoints in effect for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub download_url: String,
    pub updates_url: String,
}

/// Overrides supplied by the caller (usually CLI flags).
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub download_url: Option<String>,
    pub updates_url: Option<String>,
}

impl Settings {
    /// Pick each endpoint by precedence: override, environment, file, default.
    pub fn resolve(cli: &Overrides, env: &Overrides, file: &FileSettings) -> Self {
        let pick = |a: &Option<String>, b: &Option<String>, c: &Option<String>, d: &str| {
            a.clone()
                .or_else(|| b.clone())
                .or_else(|| c.clone())
                .unwrap_or_else(|| d.to_string())
        };
        let s = Self {
            download_url: pick(
                &cli.download_url,
                &env.download_url,
                &file.download_url,
                DEFAULT_DOWNLOAD_URL,
            ),
            updates_url: pick(
                &cli.updates_url,
                &env.updates_url,
                &file.updates_url,
                DEFAULT_UPDATES_URL,
            ),
        };
        debug!(
            download_url = %s.download_url,
            updates_url = %s.updates_url,
            "resolved settings"
        );
        s
    }

    /// Resolve against the real environment and config file.
    pub fn load(cli: &Overrides) -> Result<Self> {
        let file = load_file_settings()?;
        Ok(Self::resolve(cli, &env_overrides(), &file))
    }
}

pub fn env_overrides() -> Overrides {
    let var = |k: &str| env::var(k).ok().filter(|v| !v.is_empty());
    Overrides {
        download_url: var(DOWNLOAD_URL_ENV),
        updates_url: var(UPDATES_URL_ENV),
    }
}

pub fn config_file() -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    base.join(APP_NAME).join("config.toml")
}

/// Load `config.toml`; a missing file yields the empty settings.
pub fn load_file_settings() -> Result<FileSettings> {
    let path = config_file();
    let txt = match fs::read_to_string(&path) {
        Ok(txt) => txt,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileSettings::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    toml::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

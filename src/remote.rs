use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::version::Version;

pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Bound on each wait for the server: response headers, then every body
/// read. A stalled download fails instead of holding the update lock.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Response body of the updates endpoint.
#[derive(Debug, Deserialize)]
struct UpdateMetadata {
    name: String,
}

/// Shared blocking client. Metadata requests override the timeout with
/// [`METADATA_TIMEOUT`].
pub fn http_client() -> Result<Client> {
    client_with_timeout(DOWNLOAD_TIMEOUT)
}

pub(crate) fn client_with_timeout(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("linuxcord/", env!("CARGO_PKG_VERSION"))),
    );
    Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| Error::network("<client>", e))
}

/// Works out which version is the newest one published.
pub struct RemoteResolver {
    client: Client,
    download_url: String,
    updates_url: String,
}

impl RemoteResolver {
    pub fn new(client: Client, download_url: &str, updates_url: &str) -> Self {
        Self {
            client,
            download_url: download_url.to_string(),
            updates_url: updates_url.to_string(),
        }
    }

    /// Latest published version, or `None` when neither the updates
    /// endpoint nor the download redirect reveals one.
    pub fn latest_version(&self) -> Option<Version> {
        match self.fetch_metadata() {
            Ok(v) => {
                debug!(version = %v, "latest version from updates endpoint");
                return Some(v);
            }
            Err(e) => warn!(url = %self.updates_url, "updates endpoint unusable: {e}"),
        }

        debug!("falling back to the download redirect");
        match self.latest_download_url() {
            Ok(url) => {
                let found = version_from_url(&url);
                if found.is_none() {
                    warn!(%url, "no version in resolved download url");
                }
                found
            }
            Err(e) => {
                warn!("could not resolve download redirect: {e}");
                None
            }
        }
    }

    /// Final URL of the download after following redirects.
    pub fn latest_download_url(&self) -> Result<String> {
        let url = &self.download_url;
        let resp = self
            .client
            .head(url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::network(url, e))?;
        let final_url = resp.url().to_string();
        debug!(from = %url, to = %final_url, "resolved download redirect");
        Ok(final_url)
    }

    fn fetch_metadata(&self) -> Result<Version> {
        let url = &self.updates_url;
        let meta: UpdateMetadata = self
            .client
            .get(url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| Error::network(url, e))?;
        Version::parse(&meta.name)
    }
}

/// Pull `X.Y.Z` out of a download URL, either as a whole path segment
/// (`/apps/linux/0.0.76/...`) or right before `.tar.gz`
/// (`discord-0.0.76.tar.gz`).
pub fn version_from_url(url: &str) -> Option<Version> {
    static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [
            r"/([0-9]+\.[0-9]+\.[0-9]+)/",
            r"-([0-9]+\.[0-9]+\.[0-9]+)\.tar\.gz",
        ]
        .into_iter()
        .filter_map(|pat| Regex::new(pat).ok())
        .collect()
    });
    PATTERNS.iter().find_map(|re| {
        let caps = re.captures(url)?;
        Version::parse(caps.get(1)?.as_str()).ok()
    })
}

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything the install/update core can fail with.
///
/// Remote resolution failures never show up here: they degrade to an
/// unknown latest version instead (see `RemoteResolver::latest_version`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid version {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("malformed manifest {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("destination already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("refusing to extract unsafe archive entry: {entry}")]
    PathTraversal { entry: String },

    #[error("archive does not contain a single top-level directory")]
    MissingContent,

    #[error("expected file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("archive contains version {found}, expected {expected}")]
    VersionMismatch { expected: String, found: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("latest version is unknown; refusing to install")]
    UnknownLatest,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless mirror of [`Error`] for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Format,
    AlreadyExists,
    PathTraversal,
    MissingContent,
    NotFound,
    VersionMismatch,
    Network,
    Lock,
    UnknownLatest,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Format { .. } => ErrorKind::Format,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::PathTraversal { .. } => ErrorKind::PathTraversal,
            Error::MissingContent => ErrorKind::MissingContent,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::VersionMismatch { .. } => ErrorKind::VersionMismatch,
            Error::Network { .. } => ErrorKind::Network,
            Error::Lock { .. } => ErrorKind::Lock,
            Error::UnknownLatest => ErrorKind::UnknownLatest,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn network(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Network {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

/// Attach the offending path to an `io::Result`, in the spirit of
/// `anyhow::Context` but producing a typed [`Error::Io`].
pub(crate) trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

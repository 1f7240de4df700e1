use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a permission catalog from configuration.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("permission id must not be empty")]
    EmptyPermission,

    #[error("permission '{0}' has no API patterns")]
    NoPatterns(String),

    #[error("empty API pattern for '{0}'")]
    EmptyPattern(String),

    #[error("invalid namespace alias '{from}' -> '{to}'")]
    InvalidAlias { from: String, to: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while opening or reading a package archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("unknown archive format")]
    UnknownFormat,

    #[error("invalid CRX header: {0}")]
    InvalidCrx(String),

    #[error("corrupt archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry escapes the archive root: {0}")]
    PathTraversal(String),

    #[error("archive has {0} entries, over the configured limit")]
    TooManyEntries(usize),

    #[error("entry {name} exceeds the size limit ({size} bytes)")]
    EntryTooLarge { name: String, size: u64 },

    #[error("archive exceeds the total size limit ({0} bytes)")]
    TotalTooLarge(u64),
}

/// Package-level failures. Any of these aborts one package only.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("no manifest.json found in package")]
    ManifestMissing,

    #[error("manifest parse error in {path}: {message}")]
    ManifestParse { path: String, message: String },

    #[error("package analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("worker failed: {0}")]
    Worker(String),
}

/// File-level failures. These degrade evidence quality but never fail a package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{path} is not valid UTF-8 text")]
    Decode { path: String },

    #[error("{path} exceeds the size limit ({size} bytes)")]
    TooLarge { path: String, size: u64 },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Serialisable error tag used for triage in results and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Archive,
    ManifestMissing,
    ManifestParse,
    Timeout,
    Worker,
    SourceDecode,
    SourceTooLarge,
    SourceParse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Archive => "archive",
            ErrorKind::ManifestMissing => "manifest_missing",
            ErrorKind::ManifestParse => "manifest_parse",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Worker => "worker",
            ErrorKind::SourceDecode => "source_decode",
            ErrorKind::SourceTooLarge => "source_too_large",
            ErrorKind::SourceParse => "source_parse",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PackageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackageError::Archive(_) => ErrorKind::Archive,
            PackageError::ManifestMissing => ErrorKind::ManifestMissing,
            PackageError::ManifestParse { .. } => ErrorKind::ManifestParse,
            PackageError::Timeout(_) => ErrorKind::Timeout,
            PackageError::Worker(_) => ErrorKind::Worker,
        }
    }
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Decode { .. } => ErrorKind::SourceDecode,
            SourceError::TooLarge { .. } => ErrorKind::SourceTooLarge,
            SourceError::Parse { .. } => ErrorKind::SourceParse,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            SourceError::Decode { path }
            | SourceError::TooLarge { path, .. }
            | SourceError::Parse { path, .. } => path,
        }
    }
}

use super::{ApiCounts, CallSiteEvidence, ManifestDeclaration, OverPermissionVerdict};
use crate::error::{ErrorKind, PackageError, SourceError};
use serde::{Deserialize, Serialize};

/// Error marker carried by a package that could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PackageError> for PackageFailure {
    fn from(err: &PackageError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A file-level problem. The file was skipped or downgraded, the package was not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIssue {
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SourceError> for FileIssue {
    fn from(err: &SourceError) -> Self {
        Self {
            path: err.path().to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// JavaScript members visited.
    pub scanned: usize,
    /// Files analysed from a syntax tree.
    pub structural: usize,
    /// Files that fell back to literal matching.
    pub lexical: usize,
    /// Files skipped (undecodable or oversized).
    pub skipped: usize,
}

/// Everything known about one archive after analysis.
///
/// Failed packages still produce a result, carrying `error` and no analysis data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAnalysisResult {
    pub package: String,
    pub manifest: Option<ManifestDeclaration>,
    pub verdict: Option<OverPermissionVerdict>,
    pub evidence: CallSiteEvidence,
    pub api_counts: ApiCounts,
    pub has_wasm: bool,
    pub files: FileStats,
    pub file_issues: Vec<FileIssue>,
    pub error: Option<PackageFailure>,
}

impl PackageAnalysisResult {
    pub fn failed(package: impl Into<String>, err: &PackageError) -> Self {
        Self {
            package: package.into(),
            error: Some(PackageFailure::from(err)),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn over_permissioned(&self) -> impl Iterator<Item = &str> {
        self.verdict
            .iter()
            .flat_map(|v| v.over_permissioned.iter().map(String::as_str))
    }
}

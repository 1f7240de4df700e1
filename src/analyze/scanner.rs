use super::catalog::PermissionCatalog;
use super::inference::infer;
use super::javascript::{ScanStrategy, scan_source};
use super::manifest::resolve_manifest;
use crate::error::{ArchiveError, PackageError, SourceError};
use crate::models::{
    ApiCounts, CallSiteEvidence, FileIssue, FileStats, PackageAnalysisResult,
};
use crate::unpack::{ArchiveLimits, ArchiveMember, PackageArchive};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Analyses one package archive end to end: manifest, every script, verdict.
///
/// Holds only shared read-only state, so one scanner serves all workers.
#[derive(Debug, Clone)]
pub struct PackageScanner {
    catalog: Arc<PermissionCatalog>,
    limits: ArchiveLimits,
}

impl PackageScanner {
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self {
            catalog,
            limits: ArchiveLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ArchiveLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Read and analyse an archive on disk.
    pub fn scan_path(&self, path: &Path) -> PackageAnalysisResult {
        self.scan_path_within(path, None)
    }

    /// [`scan_path`](Self::scan_path) that gives up with a timeout error once
    /// `limit` has passed. The deadline is checked between scripts.
    pub fn scan_path_within(&self, path: &Path, limit: Option<Duration>) -> PackageAnalysisResult {
        let started = Instant::now();
        let label = path.display().to_string();
        match std::fs::read(path) {
            Ok(data) => self.scan_bytes_from(&label, &data, limit.map(|l| (started, l))),
            Err(e) => {
                let err = PackageError::Archive(ArchiveError::Io(e));
                warn!("{}: {}", label, err);
                PackageAnalysisResult::failed(label, &err)
            }
        }
    }

    /// Analyse an in-memory archive. Never fails: package-level errors come
    /// back as an error-marked result.
    pub fn scan_bytes(&self, label: &str, data: &[u8]) -> PackageAnalysisResult {
        self.scan_bytes_within(label, data, None)
    }

    pub fn scan_bytes_within(
        &self,
        label: &str,
        data: &[u8],
        limit: Option<Duration>,
    ) -> PackageAnalysisResult {
        self.scan_bytes_from(label, data, limit.map(|l| (Instant::now(), l)))
    }

    fn scan_bytes_from(
        &self,
        label: &str,
        data: &[u8],
        deadline: Option<(Instant, Duration)>,
    ) -> PackageAnalysisResult {
        match self.analyze(label, data, deadline) {
            Ok(result) => result,
            Err(err) => {
                warn!("{}: {}", label, err);
                PackageAnalysisResult::failed(label, &err)
            }
        }
    }

    fn analyze(
        &self,
        label: &str,
        data: &[u8],
        deadline: Option<(Instant, Duration)>,
    ) -> Result<PackageAnalysisResult, PackageError> {
        let mut archive = PackageArchive::open(data, self.limits)?;

        let manifest_member = archive
            .find_manifest()
            .cloned()
            .ok_or(PackageError::ManifestMissing)?;
        let manifest_bytes = archive.read(&manifest_member)?;
        let manifest_text = decode_text(&manifest_bytes).ok_or_else(|| PackageError::ManifestParse {
            path: manifest_member.path.clone(),
            message: "manifest is not valid UTF-8".to_string(),
        })?;
        let declaration = resolve_manifest(manifest_text, &self.catalog).map_err(|e| {
            PackageError::ManifestParse {
                path: manifest_member.path.clone(),
                message: e.to_string(),
            }
        })?;

        let mut evidence = CallSiteEvidence::new();
        let mut api_counts = ApiCounts::new();
        let mut files = FileStats::default();
        let mut file_issues = Vec::new();

        let scripts: Vec<ArchiveMember> = archive.javascript_members().cloned().collect();
        for member in &scripts {
            if let Some((started, limit)) = deadline
                && started.elapsed() >= limit
            {
                return Err(PackageError::Timeout(limit));
            }
            files.scanned += 1;

            let text = match self.read_source(&mut archive, member)? {
                Ok(bytes) => bytes,
                Err(issue) => {
                    warn!("{}: {}, skipping", label, issue);
                    files.skipped += 1;
                    file_issues.push(FileIssue::from(&issue));
                    continue;
                }
            };

            let scan = scan_source(&text, Path::new(&member.path), &self.catalog);
            match scan.strategy {
                ScanStrategy::Structural => files.structural += 1,
                ScanStrategy::Lexical => files.lexical += 1,
            }
            if let Some(ref err) = scan.parse_error {
                file_issues.push(FileIssue::from(err));
            }

            evidence.union(&scan.evidence);
            api_counts.merge(&scan.api_counts);
        }

        let verdict = infer(&declaration, &evidence, &self.catalog);
        debug!(
            "{}: {} scripts, {} patterns, {} over-permissioned",
            label,
            files.scanned,
            evidence.len(),
            verdict.over_permissioned.len()
        );

        Ok(PackageAnalysisResult {
            package: label.to_string(),
            has_wasm: archive.has_wasm(),
            manifest: Some(declaration),
            verdict: Some(verdict),
            evidence,
            api_counts,
            files,
            file_issues,
            error: None,
        })
    }

    /// Read one script as text. The outer error is package-level, the inner
    /// one is a file-level issue the caller skips past.
    fn read_source(
        &self,
        archive: &mut PackageArchive<'_>,
        member: &ArchiveMember,
    ) -> Result<Result<String, SourceError>, PackageError> {
        let bytes = match archive.read(member) {
            Ok(bytes) => bytes,
            Err(ArchiveError::EntryTooLarge { name, size }) => {
                return Ok(Err(SourceError::TooLarge { path: name, size }));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(decode_text(&bytes)
            .map(str::to_string)
            .ok_or_else(|| SourceError::Decode {
                path: member.path.clone(),
            }))
    }
}

/// Strict UTF-8 decode with the byte-order mark stripped.
fn decode_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    Some(text.strip_prefix('\u{feff}').unwrap_or(text))
}

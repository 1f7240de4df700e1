mod evidence;
mod extension;
mod manifest;
mod package;

pub use evidence::{ApiCounts, CallSiteEvidence, OverPermissionVerdict};
pub use extension::FileType;
pub use manifest::ManifestDeclaration;
pub use package::{FileIssue, FileStats, PackageAnalysisResult, PackageFailure};

pub mod crx;
mod guard;

pub use guard::{ArchiveLimits, is_ignored_entry, sanitize_entry_path};

use crate::error::ArchiveError;
use crate::models::FileType;
use std::io::{Cursor, Read};
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionFormat {
    Crx,
    Zip, // XPI files are plain ZIP
    Unknown,
}

pub fn detect_format(data: &[u8]) -> ExtensionFormat {
    if data.len() < 4 {
        return ExtensionFormat::Unknown;
    }

    if data.starts_with(b"Cr24") {
        return ExtensionFormat::Crx;
    }

    // ZIP local header, or the end-of-central-directory record of an empty archive
    if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
        return ExtensionFormat::Zip;
    }

    ExtensionFormat::Unknown
}

/// The ZIP bytes of a package, with any CRX header stripped.
pub fn zip_payload(data: &[u8]) -> Result<&[u8], ArchiveError> {
    match detect_format(data) {
        ExtensionFormat::Crx => crx::crx_zip_payload(data),
        ExtensionFormat::Zip => Ok(data),
        ExtensionFormat::Unknown => Err(ArchiveError::UnknownFormat),
    }
}

/// A file inside a package archive, path already sanitised.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMember {
    pub index: usize,
    pub path: String,
    pub size: u64,
    pub file_type: FileType,
}

/// Read-only view over a package archive. Members are read in memory,
/// nothing is written to disk.
pub struct PackageArchive<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    members: Vec<ArchiveMember>,
    limits: ArchiveLimits,
    bytes_read: u64,
}

impl<'a> PackageArchive<'a> {
    /// Open an archive and validate every entry name up front. A single
    /// entry escaping the archive root rejects the whole package.
    pub fn open(data: &'a [u8], limits: ArchiveLimits) -> Result<Self, ArchiveError> {
        let payload = zip_payload(data)?;
        let mut archive = ZipArchive::new(Cursor::new(payload))?;

        if archive.len() > limits.max_entries {
            return Err(ArchiveError::TooManyEntries(archive.len()));
        }

        let mut members = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            let name = entry.name().to_string();

            let path = sanitize_entry_path(&name).ok_or(ArchiveError::PathTraversal(name))?;
            if entry.is_dir() || path.is_empty() || is_ignored_entry(&path) {
                continue;
            }

            members.push(ArchiveMember {
                index,
                file_type: FileType::from_path(&path),
                size: entry.size(),
                path,
            });
        }

        tracing::trace!("archive opened with {} members", members.len());

        Ok(Self {
            archive,
            members,
            limits,
            bytes_read: 0,
        })
    }

    pub fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    /// The manifest: a case-insensitive `manifest.json` suffix match. The
    /// shallowest path wins; archive order breaks ties.
    pub fn find_manifest(&self) -> Option<&ArchiveMember> {
        self.members
            .iter()
            .filter(|m| m.path.to_ascii_lowercase().ends_with("manifest.json"))
            .min_by_key(|m| m.path.matches('/').count())
    }

    pub fn has_wasm(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.file_type == FileType::WebAssembly)
    }

    pub fn javascript_members(&self) -> impl Iterator<Item = &ArchiveMember> {
        self.members
            .iter()
            .filter(|m| m.file_type == FileType::JavaScript)
    }

    /// Decompress one member, enforcing the per-entry and total size limits
    /// on the bytes actually produced.
    pub fn read(&mut self, member: &ArchiveMember) -> Result<Vec<u8>, ArchiveError> {
        let limit = self.limits.max_entry_size;
        if member.size > limit {
            return Err(ArchiveError::EntryTooLarge {
                name: member.path.clone(),
                size: member.size,
            });
        }

        let mut buf = Vec::new();
        {
            let entry = self.archive.by_index(member.index)?;
            entry.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
        }

        let len = buf.len() as u64;
        if len > limit {
            return Err(ArchiveError::EntryTooLarge {
                name: member.path.clone(),
                size: len,
            });
        }

        self.bytes_read += len;
        if self.bytes_read > self.limits.max_total_size {
            return Err(ArchiveError::TotalTooLarge(self.bytes_read));
        }

        Ok(buf)
    }
}

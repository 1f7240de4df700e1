//! Archive safety limits and entry-path sanitising (zip slip).

use serde::{Deserialize, Serialize};

/// Maximum number of members per archive.
pub const MAX_ENTRIES: usize = 10_000;

/// Maximum decompressed size of a single member (100 MB).
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum decompressed size read from one archive (1 GB).
pub const MAX_TOTAL_SIZE: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveLimits {
    pub max_entries: usize,
    pub max_entry_size: u64,
    pub max_total_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
            max_entry_size: MAX_ENTRY_SIZE,
            max_total_size: MAX_TOTAL_SIZE,
        }
    }
}

/// Normalise an archive entry name to a relative `/`-separated path.
///
/// Returns `None` when the entry is absolute, carries a drive prefix, or
/// climbs above the archive root once `.` and `..` are resolved.
pub fn sanitize_entry_path(entry_name: &str) -> Option<String> {
    let name = entry_name.replace('\\', "/");
    if name.starts_with('/') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for (i, component) in name.split('/').enumerate() {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            c if i == 0 && is_drive_prefix(c) => return None,
            c => parts.push(c),
        }
    }

    Some(parts.join("/"))
}

fn is_drive_prefix(component: &str) -> bool {
    let bytes = component.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// macOS resource-fork noise that never holds extension code.
pub fn is_ignored_entry(path: &str) -> bool {
    path.starts_with("__MACOSX/")
        || path
            .rsplit('/')
            .next()
            .is_some_and(|name| name.starts_with("._"))
}

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static PACKAGE_EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(zip|crx|xpi)$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum InputType {
    /// A single package file.
    Archive(PathBuf),
    /// A directory searched recursively for packages.
    Directory(PathBuf),
    Missing(PathBuf),
}

pub fn detect_input(input: &str) -> InputType {
    let path = PathBuf::from(input.trim());

    if path.is_dir() {
        return InputType::Directory(path);
    }

    // Named files are always scanned, whatever their extension; the format
    // is sniffed from the content.
    if path.is_file() {
        return InputType::Archive(path);
    }

    InputType::Missing(path)
}

/// Whether a file name looks like an extension package.
pub fn is_package_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| PACKAGE_EXT_RE.is_match(n))
}

/// Expand command-line inputs into the package files to analyse, in a
/// stable order. Directories contribute `.zip`, `.crx` and `.xpi` files.
pub fn collect_packages(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut packages = Vec::new();

    for input in inputs {
        match detect_input(input) {
            InputType::Archive(path) => packages.push(path),
            InputType::Directory(dir) => {
                let before = packages.len();
                for entry in WalkDir::new(&dir).sort_by_file_name() {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            tracing::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                            continue;
                        }
                    };
                    if entry.file_type().is_file() && is_package_path(entry.path()) {
                        packages.push(entry.into_path());
                    }
                }
                tracing::debug!("{}: {} packages", dir.display(), packages.len() - before);
            }
            InputType::Missing(path) => bail!("input not found: {}", path.display()),
        }
    }

    Ok(packages)
}

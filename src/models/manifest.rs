use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Permissions a package declares, resolved against the catalog.
///
/// Created once per package from its manifest and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDeclaration {
    pub name: Option<String>,
    pub version: Option<String>,
    pub manifest_version: Option<u8>,
    /// Raw union of `permissions` and `host_permissions`.
    pub all_declared_permissions: BTreeSet<String>,
    /// Declared permissions the catalog has patterns for.
    pub known_api_permissions: BTreeSet<String>,
    /// Reported only; never part of the inference.
    pub optional_permissions: BTreeSet<String>,
}

impl ManifestDeclaration {
    /// Declared, non-host permissions the catalog does not know about.
    pub fn unrecognized_permissions(&self) -> impl Iterator<Item = &str> {
        self.all_declared_permissions
            .iter()
            .filter(|p| !p.trim().is_empty())
            .filter(|p| !self.known_api_permissions.contains(p.trim()))
            .filter(|p| !crate::analyze::manifest::is_host_permission(p.trim()))
            .map(String::as_str)
    }

    pub fn host_permissions(&self) -> impl Iterator<Item = &str> {
        self.all_declared_permissions
            .iter()
            .filter(|p| crate::analyze::manifest::is_host_permission(p.trim()))
            .map(String::as_str)
    }
}

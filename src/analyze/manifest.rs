use super::catalog::PermissionCatalog;
use super::patterns::HOST_PERMISSION_PREFIXES;
use crate::models::ManifestDeclaration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

static URL_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap());

/// Whether a declared permission is a host/URL match pattern rather than a
/// named capability (`<all_urls>`, `*://*/*`, `https://example.com/*`).
pub fn is_host_permission(perm: &str) -> bool {
    HOST_PERMISSION_PREFIXES.iter().any(|p| perm.starts_with(p)) || URL_SCHEME_RE.is_match(perm)
}

/// Parse an untrusted manifest document. The root must be a JSON object.
pub fn parse_manifest(json: &str) -> Result<Value, serde_json::Error> {
    let value: Value = serde_json::from_str(json.trim_start_matches('\u{feff}'))?;
    if !value.is_object() {
        return Err(<serde_json::Error as serde::de::Error>::custom(
            "manifest root is not a JSON object",
        ));
    }
    Ok(value)
}

/// Parse a manifest and resolve its permissions against the catalog.
pub fn resolve_manifest(
    json: &str,
    catalog: &PermissionCatalog,
) -> Result<ManifestDeclaration, serde_json::Error> {
    let manifest = parse_manifest(json)?;
    Ok(resolve_declaration(&manifest, catalog))
}

/// Build the declaration from an already parsed manifest.
///
/// Absent or ill-typed fields count as empty; only string entries are kept.
pub fn resolve_declaration(manifest: &Value, catalog: &PermissionCatalog) -> ManifestDeclaration {
    let mut all_declared_permissions = string_set(manifest, "permissions");
    all_declared_permissions.extend(string_set(manifest, "host_permissions"));

    // Entries are kept verbatim; classification looks at the trimmed token.
    let known_api_permissions = all_declared_permissions
        .iter()
        .map(|p| p.trim())
        .filter(|p| !is_host_permission(p) && catalog.contains_permission(p))
        .map(str::to_string)
        .collect();

    ManifestDeclaration {
        name: string_field(manifest, "name"),
        version: string_field(manifest, "version"),
        manifest_version: manifest
            .get("manifest_version")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok()),
        all_declared_permissions,
        known_api_permissions,
        optional_permissions: string_set(manifest, "optional_permissions"),
    }
}

fn string_set(manifest: &Value, key: &str) -> BTreeSet<String> {
    manifest
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(manifest: &Value, key: &str) -> Option<String> {
    manifest.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_permission_shapes() {
        assert!(is_host_permission("<all_urls>"));
        assert!(is_host_permission("*://*/*"));
        assert!(is_host_permission("https://example.com/*"));
        assert!(is_host_permission("file:///*"));
        assert!(is_host_permission("*:"));
        assert!(!is_host_permission("tabs"));
        assert!(!is_host_permission("system.cpu"));
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        assert!(parse_manifest("[1, 2]").is_err());
        assert!(parse_manifest("\"tabs\"").is_err());
    }

    #[test]
    fn test_bom_is_tolerated() {
        assert!(parse_manifest("\u{feff}{\"name\": \"x\"}").is_ok());
    }
}

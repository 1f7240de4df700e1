use extperm::analyze::PermissionCatalog;
use extperm::analyze::manifest::{is_host_permission, parse_manifest, resolve_manifest};

#[test]
fn test_parse_manifest() {
    let json = r#"{
        "name": "Test Extension",
        "version": "1.0.0",
        "manifest_version": 3,
        "permissions": ["storage", "tabs"]
    }"#;

    let catalog = PermissionCatalog::builtin();
    let manifest = resolve_manifest(json, &catalog).unwrap();
    assert_eq!(manifest.name, Some("Test Extension".to_string()));
    assert_eq!(manifest.manifest_version, Some(3));
    assert!(manifest.known_api_permissions.contains("tabs"));
    assert!(manifest.known_api_permissions.contains("storage"));
}

#[test]
fn test_host_and_unknown_permissions_are_not_known() {
    let json = r#"{
        "manifest_version": 3,
        "permissions": ["<all_urls>", "cookies", "somethingMadeUp"],
        "host_permissions": ["https://example.com/*", "*://*/*"]
    }"#;

    let catalog = PermissionCatalog::builtin();
    let manifest = resolve_manifest(json, &catalog).unwrap();

    assert_eq!(manifest.all_declared_permissions.len(), 5);
    assert_eq!(
        manifest.known_api_permissions.iter().collect::<Vec<_>>(),
        vec!["cookies"]
    );
    assert_eq!(manifest.unrecognized_permissions().collect::<Vec<_>>(), vec!["somethingMadeUp"]);
    assert_eq!(manifest.host_permissions().count(), 3);
}

#[test]
fn test_missing_and_ill_typed_fields_are_empty() {
    let catalog = PermissionCatalog::builtin();

    let manifest = resolve_manifest(r#"{"name": "Bare"}"#, &catalog).unwrap();
    assert!(manifest.all_declared_permissions.is_empty());
    assert!(manifest.known_api_permissions.is_empty());

    let manifest = resolve_manifest(r#"{"permissions": "tabs", "manifest_version": "3"}"#, &catalog).unwrap();
    assert!(manifest.all_declared_permissions.is_empty());
    assert_eq!(manifest.manifest_version, None);

    let manifest = resolve_manifest(r#"{"permissions": ["tabs", 7, null]}"#, &catalog).unwrap();
    assert_eq!(manifest.all_declared_permissions.len(), 1);
}

#[test]
fn test_optional_permissions_are_not_declared() {
    let json = r#"{"permissions": ["alarms"], "optional_permissions": ["tabs"]}"#;
    let manifest = resolve_manifest(json, &PermissionCatalog::builtin()).unwrap();
    assert!(manifest.optional_permissions.contains("tabs"));
    assert!(!manifest.known_api_permissions.contains("tabs"));
}

#[test]
fn test_invalid_manifest_is_rejected() {
    assert!(parse_manifest(r#"{"name": "Trunc"#).is_err());
    assert!(parse_manifest("[1, 2, 3]").is_err());
    assert!(parse_manifest("\u{feff}{}").is_ok());
}

#[test]
fn test_host_permission_detection() {
    assert!(is_host_permission("<all_urls>"));
    assert!(is_host_permission("*://*/*"));
    assert!(is_host_permission("https://example.com/*"));
    assert!(is_host_permission("file:///*"));
    assert!(!is_host_permission("tabs"));
    assert!(!is_host_permission("system.cpu"));
}

#[test]
fn test_padded_permission_kept_verbatim() {
    let json = r#"{"permissions": [" tabs ", "storage", "", 7]}"#;
    let manifest = resolve_manifest(json, &PermissionCatalog::builtin()).unwrap();

    assert!(manifest.all_declared_permissions.contains(" tabs "));
    assert!(manifest.all_declared_permissions.contains(""));
    assert_eq!(manifest.all_declared_permissions.len(), 3);
    assert!(manifest.known_api_permissions.contains("tabs"));
    assert!(manifest.known_api_permissions.contains("storage"));
    assert_eq!(manifest.unrecognized_permissions().count(), 0);
}

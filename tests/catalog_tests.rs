use extperm::Config;
use extperm::analyze::{CatalogConfig, PermissionCatalog};
use extperm::error::CatalogError;
use std::io::Write;

#[test]
fn test_reverse_index_is_exact_inverse() {
    let catalog = PermissionCatalog::builtin();
    let reverse = catalog.reverse_index();

    for permission in catalog.permissions() {
        for pattern in catalog.lookup_patterns(permission).unwrap() {
            assert!(
                reverse.lookup(pattern).unwrap().contains(permission),
                "{} missing from reverse entry {}",
                permission,
                pattern
            );
        }
    }

    for pattern in reverse.patterns() {
        for permission in reverse.lookup(pattern).unwrap() {
            assert!(catalog.lookup_patterns(permission).unwrap().contains(pattern));
        }
    }
}

#[test]
fn test_reverse_index_is_deterministic() {
    let a = PermissionCatalog::builtin();
    let b = PermissionCatalog::builtin();
    assert_eq!(a.reverse_index(), b.reverse_index());
}

#[test]
fn test_shared_pattern_maps_to_both_permissions() {
    let catalog = PermissionCatalog::builtin();
    let permissions = catalog.lookup_permissions("chrome.webRequest.").unwrap();
    assert!(permissions.contains("webRequest"));
    assert!(permissions.contains("webRequestBlocking"));
}

#[test]
fn test_validation_rejects_empty_patterns() {
    let config = CatalogConfig::from_json_str(r#"{"permissions": {"tabs": []}}"#).unwrap();
    assert!(matches!(
        PermissionCatalog::from_config(config),
        Err(CatalogError::NoPatterns(ref p)) if p == "tabs"
    ));

    let config = CatalogConfig::from_json_str(r#"{"permissions": {"tabs": ["  "]}}"#).unwrap();
    assert!(matches!(
        PermissionCatalog::from_config(config),
        Err(CatalogError::EmptyPattern(_))
    ));

    let config = CatalogConfig::from_json_str(r#"{"permissions": {"": ["chrome.x."]}}"#).unwrap();
    assert!(matches!(
        PermissionCatalog::from_config(config),
        Err(CatalogError::EmptyPermission)
    ));
}

#[test]
fn test_validation_rejects_bad_aliases() {
    let config = CatalogConfig::from_toml_str(
        r#"
[permissions]
tabs = ["chrome.tabs."]

[namespace_aliases]
"moz.browser" = "chrome"
"#,
    )
    .unwrap();
    assert!(matches!(
        PermissionCatalog::from_config(config),
        Err(CatalogError::InvalidAlias { .. })
    ));
}

#[test]
fn test_malformed_catalog_text() {
    assert!(matches!(
        CatalogConfig::from_json_str("{not json"),
        Err(CatalogError::Json(_))
    ));
    assert!(matches!(
        CatalogConfig::from_toml_str("permissions = ["),
        Err(CatalogError::Toml(_))
    ));
}

#[test]
fn test_merge_unions_pattern_lists() {
    let extra = CatalogConfig::from_json_str(
        r#"{"permissions": {"tabs": ["chrome.tabs.", "chrome.tabGroups."], "myApi": ["myApi."]}}"#,
    )
    .unwrap();
    let catalog = PermissionCatalog::from_config(CatalogConfig::builtin().merge(extra)).unwrap();

    let tabs = catalog.lookup_patterns("tabs").unwrap();
    assert!(tabs.contains("chrome.tabs."));
    assert!(tabs.contains("chrome.tabGroups."));
    assert!(catalog.contains_permission("myApi"));
    assert!(catalog.contains_permission("cookies"));
}

#[test]
fn test_config_loads_toml_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[permissions]\nvendorApi = [\"vendor.api.\"]").unwrap();

    let mut config = Config::default();
    config.catalog.path = Some(path.clone());

    let extended = config.build_catalog().unwrap();
    assert!(extended.contains_permission("vendorApi"));
    assert!(extended.contains_permission("tabs"));

    config.catalog.extend_builtin = false;
    let replaced = config.build_catalog().unwrap();
    assert!(replaced.contains_permission("vendorApi"));
    assert!(!replaced.contains_permission("tabs"));
}

#[test]
fn test_config_loads_json_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, r#"{"permissions": {"vendorApi": ["vendor.api."]}}"#).unwrap();

    let loaded = CatalogConfig::load(&path).unwrap();
    assert_eq!(loaded.permissions["vendorApi"], vec!["vendor.api.".to_string()]);
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let mut config = Config::default();
    config.catalog.path = Some("/nonexistent/catalog.toml".into());
    assert!(config.build_catalog().is_err());
}

#[test]
fn test_high_risk_tier_from_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        "high_risk = [\"vendorApi\"]\n\n[permissions]\nvendorApi = [\"vendor.api.\"]\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.catalog.path = Some(path);

    let extended = config.build_catalog().unwrap();
    assert!(extended.is_high_risk("vendorApi"));
    assert!(extended.is_high_risk("cookies"));

    config.catalog.extend_builtin = false;
    let replaced = config.build_catalog().unwrap();
    assert!(replaced.is_high_risk("vendorApi"));
    assert!(!replaced.is_high_risk("cookies"));
    assert_eq!(replaced.high_risk_permissions().collect::<Vec<_>>(), vec!["vendorApi"]);
}

#[test]
fn test_blank_high_risk_entry_is_rejected() {
    let config = CatalogConfig::from_json_str(
        r#"{"permissions": {"tabs": ["chrome.tabs."]}, "high_risk": [" "]}"#,
    )
    .unwrap();
    assert!(matches!(
        PermissionCatalog::from_config(config),
        Err(CatalogError::EmptyPermission)
    ));
}

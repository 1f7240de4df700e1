use extperm::analyze::javascript::scan_structural;
use extperm::analyze::{PermissionCatalog, ScanStrategy, scan_source};
use std::path::PathBuf;

fn scan(code: &str) -> extperm::analyze::FileScan {
    scan_source(code, &PathBuf::from("test.js"), &PermissionCatalog::builtin())
}

#[test]
fn test_detect_chrome_api_call() {
    let code = r#"
        chrome.tabs.create({ url: "https://example.com" });
    "#;

    let result = scan(code);

    assert_eq!(result.strategy, ScanStrategy::Structural);
    assert!(result.evidence.contains("chrome.tabs."));
    assert_eq!(result.evidence.len(), 1);
}

#[test]
fn test_alias_resolved() {
    let code = r#"
        const t = chrome.tabs;
        t.create({ url: "https://example.com" });
    "#;

    let result = scan(code);
    assert!(result.evidence.contains("chrome.tabs."));
}

#[test]
fn test_first_alias_binding_wins() {
    let code = r#"
        var api = chrome.cookies;
        var api = chrome.history;
        api.getAll({});
    "#;

    let result = scan(code);
    assert!(result.evidence.contains("chrome.cookies."));
    assert!(!result.evidence.contains("chrome.history."));
}

#[test]
fn test_browser_namespace_is_normalized() {
    let code = r#"
        browser.storage.local.get("key").then(console.log);
    "#;

    let result = scan(code);
    assert!(result.evidence.contains("chrome.storage."));
}

#[test]
fn test_nested_calls_in_callbacks() {
    let code = r#"
        chrome.runtime.onInstalled.addListener(() => {
            chrome.alarms.create("tick", { periodInMinutes: 1 });
            setTimeout(function () {
                chrome.notifications.create({});
            }, 10);
        });
    "#;

    let result = scan(code);
    assert!(result.evidence.contains("chrome.alarms."));
    assert!(result.evidence.contains("chrome.notifications."));
    assert_eq!(result.api_counts.get("Rendering", "setTimeout"), 1);
}

#[test]
fn test_geolocation_call_matches_exact_pattern() {
    let code = "navigator.geolocation.getCurrentPosition(pos => console.log(pos));";
    let result = scan(code);
    assert!(result.evidence.contains("navigator.geolocation.getCurrentPosition"));
}

#[test]
fn test_string_literal_is_not_a_call_site() {
    let code = r#"
        const docs = "see chrome.cookies.getAll for details";
        // chrome.history.search is mentioned here only
        console.log(docs);
    "#;

    let result = scan(code);
    assert_eq!(result.strategy, ScanStrategy::Structural);
    assert!(result.evidence.is_empty());
}

#[test]
fn test_syntax_error_falls_back_to_lexical() {
    let code = r#"
        function broken( {
        chrome.cookies.getAll({}, cb);
    "#;

    let result = scan(code);
    assert_eq!(result.strategy, ScanStrategy::Lexical);
    assert!(result.parse_error.is_some());
    assert!(result.evidence.contains("chrome.cookies."));
}

#[test]
fn test_structural_scan_reports_parse_error() {
    let err = scan_structural("let = ;;(", &PathBuf::from("bad.js"), &PermissionCatalog::builtin())
        .unwrap_err();
    assert!(err.to_string().contains("bad.js"));
}

#[test]
fn test_category_counts_are_occurrences() {
    let code = r#"
        fetch("/a");
        fetch("/b");
        window.fetch("/c");
        addEventListener("click", handler);
        document.addEventListener("keydown", handler);
    "#;

    let result = scan(code);
    assert_eq!(result.api_counts.get("Network", "fetch"), 2);
    assert_eq!(result.api_counts.get("User Interaction", "addEventListener"), 1);
    assert_eq!(result.api_counts.category_total("User Interaction"), 1);
}

#[test]
fn test_optional_chaining_call() {
    let code = "chrome.bookmarks?.getTree?.(cb);";
    let result = scan(code);
    assert!(result.evidence.contains("chrome.bookmarks."));
}

#[test]
fn test_document_alias_counts_category_api() {
    let code = r#"
        const x = document;
        const el = x.createElement("div");
        el.textContent = "hi";
    "#;

    let result = scan(code);
    assert_eq!(result.api_counts.get("Rendering", "document.createElement"), 1);
}

#[test]
fn test_aliases_do_not_leak_across_files() {
    let catalog = PermissionCatalog::builtin();
    let first = scan_source("const t = chrome.tabs;", &PathBuf::from("a.js"), &catalog);
    let second = scan_source("t.create({});", &PathBuf::from("b.js"), &catalog);

    assert!(first.evidence.is_empty());
    assert!(second.evidence.is_empty());
}

#[test]
fn test_default_parameter_calls_are_visited() {
    let result = scan("function init(cb = chrome.storage.local.get('k')) {}");
    assert_eq!(result.strategy, ScanStrategy::Structural);
    assert!(result.evidence.contains("chrome.storage."));

    let result = scan("const go = ({ tab = chrome.tabs.getCurrent() } = {}) => tab;");
    assert!(result.evidence.contains("chrome.tabs."));
}

#[test]
fn test_method_parameter_defaults_are_visited() {
    let code = r#"
        class Sync {
            run(items = chrome.bookmarks.getRecent(5)) { return items; }
        }
    "#;
    assert!(scan(code).evidence.contains("chrome.bookmarks."));
}

#[test]
fn test_accessor_property_value_is_visited() {
    let result = scan("class A { accessor y = chrome.history.search({}); }");
    assert!(result.evidence.contains("chrome.history."));
}

#[test]
fn test_destructured_alias_resolved() {
    let code = r#"
        const { tabs, cookies: jar } = chrome;
        tabs.create({});
        jar.getAll({}, cb);
    "#;

    let result = scan(code);
    assert!(result.evidence.contains("chrome.tabs."));
    assert!(result.evidence.contains("chrome.cookies."));
}

#[test]
fn test_destructured_alias_from_browser_namespace() {
    let result = scan("const { storage } = browser; storage.sync.set({ a: 1 });");
    assert!(result.evidence.contains("chrome.storage."));
}

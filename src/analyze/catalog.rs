//! Permission catalog and its derived reverse index.
//!
//! The catalog maps each recognised manifest permission to the API surfaces it
//! authorises. It is built once, validated, and shared read-only (behind an
//! `Arc`) by every worker. The reverse index is computed from the catalog at
//! construction time and never stored independently.

use super::patterns::{API_CATEGORIES, HIGH_RISK_PERMISSIONS, NAMESPACE_ALIASES, PERMISSION_PATTERNS};
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// External catalog configuration: data, not code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Permission id -> API patterns it authorises.
    #[serde(default)]
    pub permissions: BTreeMap<String, Vec<String>>,

    /// Category name -> API names counted under it.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    /// Namespace root -> canonical root (e.g. `browser` -> `chrome`).
    #[serde(default)]
    pub namespace_aliases: BTreeMap<String, String>,

    /// Permissions flagged as high risk when left unused.
    #[serde(default)]
    pub high_risk: Vec<String>,
}

impl CatalogConfig {
    /// The built-in tables.
    pub fn builtin() -> Self {
        let owned = |table: &[(&str, &[&str])]| -> BTreeMap<String, Vec<String>> {
            table
                .iter()
                .map(|(key, values)| {
                    (
                        key.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect()
        };

        Self {
            permissions: owned(PERMISSION_PATTERNS),
            categories: owned(API_CATEGORIES),
            namespace_aliases: NAMESPACE_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            high_risk: HIGH_RISK_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(toml)?)
    }

    /// Load a catalog file. `.toml` files are read as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Extend this configuration with another one. Pattern lists are unioned
    /// per key; aliases from `other` win.
    pub fn merge(mut self, other: CatalogConfig) -> Self {
        for (permission, patterns) in other.permissions {
            let entry = self.permissions.entry(permission).or_default();
            for pattern in patterns {
                if !entry.contains(&pattern) {
                    entry.push(pattern);
                }
            }
        }
        for (category, apis) in other.categories {
            let entry = self.categories.entry(category).or_default();
            for api in apis {
                if !entry.contains(&api) {
                    entry.push(api);
                }
            }
        }
        self.namespace_aliases.extend(other.namespace_aliases);
        for permission in other.high_risk {
            if !self.high_risk.contains(&permission) {
                self.high_risk.push(permission);
            }
        }
        self
    }
}

/// Inverse of the permission table: API pattern -> permissions justifying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReversePatternIndex {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl ReversePatternIndex {
    pub fn build(permissions: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (permission, patterns) in permissions {
            for pattern in patterns {
                map.entry(pattern.clone())
                    .or_default()
                    .insert(permission.clone());
            }
        }
        Self { map }
    }

    pub fn lookup(&self, pattern: &str) -> Option<&BTreeSet<String>> {
        self.map.get(pattern)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A pattern as searched for by the lexical strategy: the pattern itself plus
/// every namespace spelling that should count as the same surface.
#[derive(Debug, Clone)]
pub struct LexicalNeedle {
    pub pattern: String,
    pub spellings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    permissions: BTreeMap<String, BTreeSet<String>>,
    reverse: ReversePatternIndex,
    /// api -> category
    categories: BTreeMap<String, String>,
    aliases: Vec<(String, String)>,
    high_risk: BTreeSet<String>,
    exact: HashSet<String>,
    prefixes: Vec<String>,
    known_paths: HashSet<String>,
    permission_needles: Vec<LexicalNeedle>,
    category_needles: Vec<LexicalNeedle>,
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PermissionCatalog {
    /// Catalog built from the built-in tables.
    pub fn builtin() -> Self {
        Self::build(CatalogConfig::builtin())
    }

    /// Validate a configuration and build the catalog from it.
    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        validate(&config)?;
        Ok(Self::build(config))
    }

    fn build(config: CatalogConfig) -> Self {
        let permissions: BTreeMap<String, BTreeSet<String>> = config
            .permissions
            .into_iter()
            .map(|(permission, patterns)| {
                let patterns = patterns.into_iter().map(|p| p.trim().to_string()).collect();
                (permission.trim().to_string(), patterns)
            })
            .collect();

        let reverse = ReversePatternIndex::build(&permissions);

        let mut categories = BTreeMap::new();
        for (category, apis) in &config.categories {
            for api in apis {
                if let Some(existing) = categories.get(api.as_str()) {
                    tracing::debug!("API {} already counted under {}, ignoring {}", api, existing, category);
                    continue;
                }
                categories.insert(api.clone(), category.clone());
            }
        }

        let aliases: Vec<(String, String)> = config.namespace_aliases.into_iter().collect();
        let high_risk = config.high_risk.iter().map(|p| p.trim().to_string()).collect();

        let mut exact = HashSet::new();
        let mut prefixes = Vec::new();
        for pattern in reverse.patterns() {
            if is_prefix_pattern(pattern) {
                prefixes.push(pattern.to_string());
            } else {
                exact.insert(pattern.to_string());
            }
        }

        let mut known_paths = HashSet::new();
        for path in reverse.patterns().chain(categories.keys().map(String::as_str)) {
            let trimmed = path.trim_end_matches('.');
            let mut end = 0;
            for segment in trimmed.split('.') {
                end += segment.len();
                known_paths.insert(trimmed[..end].to_string());
                end += 1;
            }
        }

        let needle = |pattern: &str| LexicalNeedle {
            pattern: pattern.to_string(),
            spellings: spellings(pattern, &aliases),
        };
        let permission_needles = reverse.patterns().map(needle).collect();
        let category_needles = categories.keys().map(|api| needle(api)).collect();

        Self {
            permissions,
            reverse,
            categories,
            aliases,
            high_risk,
            exact,
            prefixes,
            known_paths,
            permission_needles,
            category_needles,
        }
    }

    pub fn lookup_patterns(&self, permission: &str) -> Option<&BTreeSet<String>> {
        self.permissions.get(permission)
    }

    pub fn lookup_permissions(&self, pattern: &str) -> Option<&BTreeSet<String>> {
        self.reverse.lookup(pattern)
    }

    pub fn contains_permission(&self, permission: &str) -> bool {
        self.permissions.contains_key(permission)
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.keys().map(String::as_str)
    }

    pub fn is_high_risk(&self, permission: &str) -> bool {
        self.high_risk.contains(permission)
    }

    pub fn high_risk_permissions(&self) -> impl Iterator<Item = &str> {
        self.high_risk.iter().map(String::as_str)
    }

    pub fn reverse_index(&self) -> &ReversePatternIndex {
        &self.reverse
    }

    pub fn category_of(&self, api: &str) -> Option<&str> {
        self.categories.get(api).map(String::as_str)
    }

    /// Rewrite an aliased namespace root (`browser.tabs.create`) to its
    /// canonical spelling (`chrome.tabs.create`).
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        for (from, to) in &self.aliases {
            if name == from {
                return Cow::Owned(to.clone());
            }
            if let Some(rest) = name.strip_prefix(from.as_str())
                && rest.starts_with('.')
            {
                return Cow::Owned(format!("{}{}", to, rest));
            }
        }
        Cow::Borrowed(name)
    }

    /// Permission patterns matched by an observed (normalised) dotted name.
    /// Prefix patterns match by literal `starts_with`, others by equality.
    pub fn matching_patterns(&self, name: &str) -> Vec<&str> {
        let mut found = Vec::new();
        if let Some(pattern) = self.exact.get(name) {
            found.push(pattern.as_str());
        }
        for prefix in &self.prefixes {
            if name.starts_with(prefix.as_str()) {
                found.push(prefix.as_str());
            }
        }
        found
    }

    /// Whether a resolved name denotes a catalogued surface or a path leading
    /// to one. Only such names are worth remembering as aliases.
    pub fn is_known_path(&self, name: &str) -> bool {
        self.known_paths.contains(name)
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn permission_needles(&self) -> &[LexicalNeedle] {
        &self.permission_needles
    }

    pub fn category_needles(&self) -> &[LexicalNeedle] {
        &self.category_needles
    }
}

pub fn is_prefix_pattern(pattern: &str) -> bool {
    pattern.ends_with('.')
}

fn spellings(pattern: &str, aliases: &[(String, String)]) -> Vec<String> {
    let mut out = vec![pattern.to_string()];
    for (from, to) in aliases {
        if let Some(rest) = pattern.strip_prefix(to.as_str())
            && rest.starts_with('.')
        {
            out.push(format!("{}{}", from, rest));
        }
    }
    out
}

fn validate(config: &CatalogConfig) -> Result<(), CatalogError> {
    for (permission, patterns) in &config.permissions {
        if permission.trim().is_empty() {
            return Err(CatalogError::EmptyPermission);
        }
        if patterns.is_empty() {
            return Err(CatalogError::NoPatterns(permission.clone()));
        }
        if patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(CatalogError::EmptyPattern(permission.clone()));
        }
    }
    for (category, apis) in &config.categories {
        if apis.iter().any(|a| a.trim().is_empty()) {
            return Err(CatalogError::EmptyPattern(category.clone()));
        }
    }
    if config.high_risk.iter().any(|p| p.trim().is_empty()) {
        return Err(CatalogError::EmptyPermission);
    }
    for (from, to) in &config.namespace_aliases {
        let bad = |s: &str| s.is_empty() || s.contains('.') || s.contains(char::is_whitespace);
        if bad(from) || bad(to) || from == to {
            return Err(CatalogError::InvalidAlias {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_is_valid() {
        assert!(validate(&CatalogConfig::builtin()).is_ok());
    }

    #[test]
    fn test_builtin_high_risk_tier() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.high_risk_permissions().count(), 12);
        assert!(catalog.is_high_risk("webRequestBlocking"));
        assert!(catalog.is_high_risk("nativeMessaging"));
        assert!(!catalog.is_high_risk("alarms"));
        assert!(!catalog.is_high_risk("storage"));
    }

    #[test]
    fn test_normalize_browser_namespace() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.normalize("browser.tabs.query"), "chrome.tabs.query");
        assert_eq!(catalog.normalize("browser"), "chrome");
        assert_eq!(catalog.normalize("browserHistory.x"), "browserHistory.x");
    }

    #[test]
    fn test_prefix_and_exact_matching() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.matching_patterns("chrome.tabs.create"), vec!["chrome.tabs."]);
        assert_eq!(
            catalog.matching_patterns("navigator.geolocation.getCurrentPosition"),
            vec!["navigator.geolocation.getCurrentPosition"]
        );
        assert!(catalog.matching_patterns("chrome.tabs").is_empty());
        assert!(catalog.matching_patterns("console.log").is_empty());
    }

    #[test]
    fn test_known_paths() {
        let catalog = PermissionCatalog::builtin();
        assert!(catalog.is_known_path("chrome"));
        assert!(catalog.is_known_path("chrome.tabs"));
        assert!(catalog.is_known_path("chrome.tabs.onUpdated"));
        assert!(catalog.is_known_path("document"));
        assert!(!catalog.is_known_path("console"));
    }

    #[test]
    fn test_lexical_needle_spellings() {
        let catalog = PermissionCatalog::builtin();
        let needle = catalog
            .permission_needles()
            .iter()
            .find(|p| p.pattern == "chrome.cookies.")
            .unwrap();
        assert_eq!(needle.spellings, vec!["chrome.cookies.", "browser.cookies."]);
    }
}

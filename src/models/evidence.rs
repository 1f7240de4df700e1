use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// API patterns observed anywhere in a package's own code.
///
/// Package-level: a pattern found in any file counts for the whole package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSiteEvidence {
    patterns: BTreeSet<String>,
}

impl CallSiteEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        self.patterns.insert(pattern.into())
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn union(&mut self, other: &CallSiteEvidence) {
        self.patterns.extend(other.patterns.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CallSiteEvidence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Occurrences of categorised APIs: category -> api -> count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiCounts {
    counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl ApiCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: &str, api: &str, n: u64) {
        if n == 0 {
            return;
        }
        *self
            .counts
            .entry(category.to_string())
            .or_default()
            .entry(api.to_string())
            .or_insert(0) += n;
    }

    pub fn merge(&mut self, other: &ApiCounts) {
        for (category, apis) in &other.counts {
            for (api, n) in apis {
                self.add(category, api, *n);
            }
        }
    }

    pub fn get(&self, category: &str, api: &str) -> u64 {
        self.counts
            .get(category)
            .and_then(|apis| apis.get(api))
            .copied()
            .unwrap_or(0)
    }

    pub fn category_total(&self, category: &str) -> u64 {
        self.counts
            .get(category)
            .map(|apis| apis.values().sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().flat_map(|apis| apis.values()).sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, u64>)> {
        self.counts.iter().map(|(c, apis)| (c.as_str(), apis))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Outcome of correlating declared permissions with call-site evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverPermissionVerdict {
    /// Known declared permissions with corroborating evidence.
    pub confirmed_used: BTreeSet<String>,
    /// Known declared permissions without any.
    pub over_permissioned: BTreeSet<String>,
    /// The part of `over_permissioned` the catalog rates high risk.
    #[serde(default)]
    pub high_risk_unused: BTreeSet<String>,
}

impl OverPermissionVerdict {
    pub fn is_over_permissioned(&self) -> bool {
        !self.over_permissioned.is_empty()
    }

    pub fn has_high_risk_unused(&self) -> bool {
        !self.high_risk_unused.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_counts_merge_and_totals() {
        let mut a = ApiCounts::new();
        a.add("Network", "fetch", 2);
        let mut b = ApiCounts::new();
        b.add("Network", "fetch", 1);
        b.add("Rendering", "setTimeout", 4);
        b.add("Rendering", "setInterval", 0);

        a.merge(&b);
        assert_eq!(a.get("Network", "fetch"), 3);
        assert_eq!(a.category_total("Rendering"), 4);
        assert_eq!(a.get("Rendering", "setInterval"), 0);
        assert_eq!(a.total(), 7);
    }

    #[test]
    fn test_evidence_union() {
        let mut a: CallSiteEvidence = ["chrome.tabs."].into_iter().collect();
        let b: CallSiteEvidence = ["chrome.tabs.", "chrome.cookies."].into_iter().collect();
        a.union(&b);
        assert_eq!(a.len(), 2);
        assert!(a.contains("chrome.cookies."));
    }
}

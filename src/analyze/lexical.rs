use super::catalog::PermissionCatalog;
use super::javascript::{FileScan, ScanStrategy};
use crate::models::{ApiCounts, CallSiteEvidence};

/// Literal-containment scan over raw file text.
///
/// Over-approximates: a pattern inside a string or comment counts the same
/// as a real call. Permission evidence is containment, category counts are
/// non-overlapping occurrence counts.
pub fn scan_lexical(content: &str, catalog: &PermissionCatalog) -> FileScan {
    let mut evidence = CallSiteEvidence::new();
    for needle in catalog.permission_needles() {
        if needle.spellings.iter().any(|s| content.contains(s.as_str())) {
            evidence.insert(needle.pattern.as_str());
        }
    }

    let mut api_counts = ApiCounts::new();
    for needle in catalog.category_needles() {
        let Some(category) = catalog.category_of(&needle.pattern) else {
            continue;
        };
        let hits: usize = needle
            .spellings
            .iter()
            .map(|s| content.matches(s.as_str()).count())
            .sum();
        api_counts.add(category, &needle.pattern, hits as u64);
    }

    FileScan {
        evidence,
        api_counts,
        strategy: ScanStrategy::Lexical,
        parse_error: None,
    }
}

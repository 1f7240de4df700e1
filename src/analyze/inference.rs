use super::catalog::PermissionCatalog;
use crate::models::{CallSiteEvidence, ManifestDeclaration, OverPermissionVerdict};
use std::collections::BTreeSet;

/// Correlate declared permissions with observed evidence.
///
/// For each observed pattern, the permissions that justify it (via the
/// reverse index) are intersected with the known declared set; whatever
/// known permission is left unjustified is over-permissioned. Pure and
/// order-independent.
pub fn infer(
    declaration: &ManifestDeclaration,
    evidence: &CallSiteEvidence,
    catalog: &PermissionCatalog,
) -> OverPermissionVerdict {
    let known = &declaration.known_api_permissions;

    let confirmed_used: BTreeSet<String> = evidence
        .iter()
        .filter_map(|pattern| catalog.lookup_permissions(pattern))
        .flat_map(|permissions| permissions.intersection(known))
        .cloned()
        .collect();

    let over_permissioned: BTreeSet<String> = known.difference(&confirmed_used).cloned().collect();
    let high_risk_unused = over_permissioned
        .iter()
        .filter(|p| catalog.is_high_risk(p))
        .cloned()
        .collect();

    OverPermissionVerdict {
        confirmed_used,
        over_permissioned,
        high_risk_unused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(known: &[&str]) -> ManifestDeclaration {
        ManifestDeclaration {
            all_declared_permissions: known.iter().map(|s| s.to_string()).collect(),
            known_api_permissions: known.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_pattern_confirms_both_permissions() {
        let catalog = PermissionCatalog::builtin();
        let decl = declaration(&["webRequest", "webRequestBlocking"]);
        let evidence: CallSiteEvidence = ["chrome.webRequest."].into_iter().collect();

        let verdict = infer(&decl, &evidence, &catalog);
        assert!(verdict.over_permissioned.is_empty());
        assert_eq!(verdict.confirmed_used.len(), 2);
    }

    #[test]
    fn test_evidence_for_undeclared_permission_is_ignored() {
        let catalog = PermissionCatalog::builtin();
        let decl = declaration(&["tabs"]);
        let evidence: CallSiteEvidence = ["chrome.cookies."].into_iter().collect();

        let verdict = infer(&decl, &evidence, &catalog);
        assert!(verdict.confirmed_used.is_empty());
        assert!(verdict.over_permissioned.contains("tabs"));
    }
}

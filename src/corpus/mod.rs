//! Cross-package statistics.
//!
//! Workers never touch the summary: each returns its own
//! `PackageAnalysisResult` and a single consumer folds them in with
//! [`CorpusSummary::record`]. Folding is commutative, so completion order
//! does not matter.

mod runner;

pub use runner::{CorpusOptions, CorpusReport, PackageInput, run_corpus, run_corpus_until};

use crate::error::ErrorKind;
use crate::models::{ApiCounts, PackageAnalysisResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub packages_processed: usize,
    pub packages_analyzed: usize,
    pub packages_errored: usize,
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,
    pub file_issues_by_kind: BTreeMap<ErrorKind, usize>,
    /// category -> api -> occurrences across the corpus
    pub api_frequency: ApiCounts,
    /// permission -> packages declaring it without evidence
    pub over_permission_frequency: BTreeMap<String, usize>,
    /// Same, restricted to high-risk permissions.
    #[serde(default)]
    pub high_risk_over_permission_frequency: BTreeMap<String, usize>,
    /// permission -> packages declaring it (known permissions only)
    pub declared_permission_frequency: BTreeMap<String, usize>,
    /// permission -> packages declaring it although the catalog has no entry
    pub unrecognized_permission_frequency: BTreeMap<String, usize>,
    pub over_permissioned_packages: usize,
    /// Over-permissioned packages with at least one unused high-risk permission.
    #[serde(default)]
    pub high_risk_packages: usize,
    pub wasm_packages: usize,
}

impl CorpusSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a PackageAnalysisResult>) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.record(result);
        }
        summary
    }

    /// Fold one package result into the totals. Error-marked results only
    /// count toward the processed/errored tallies.
    pub fn record(&mut self, result: &PackageAnalysisResult) {
        self.packages_processed += 1;

        if let Some(kind) = result.error_kind() {
            self.packages_errored += 1;
            *self.errors_by_kind.entry(kind).or_insert(0) += 1;
            return;
        }

        self.packages_analyzed += 1;
        self.api_frequency.merge(&result.api_counts);

        for issue in &result.file_issues {
            *self.file_issues_by_kind.entry(issue.kind).or_insert(0) += 1;
        }
        if result.has_wasm {
            self.wasm_packages += 1;
        }

        if let Some(ref manifest) = result.manifest {
            for permission in &manifest.known_api_permissions {
                bump(&mut self.declared_permission_frequency, permission);
            }
            for permission in manifest.unrecognized_permissions() {
                bump(&mut self.unrecognized_permission_frequency, permission);
            }
        }

        if let Some(ref verdict) = result.verdict
            && verdict.is_over_permissioned()
        {
            self.over_permissioned_packages += 1;
            for permission in &verdict.over_permissioned {
                bump(&mut self.over_permission_frequency, permission);
            }
            if verdict.has_high_risk_unused() {
                self.high_risk_packages += 1;
            }
            for permission in &verdict.high_risk_unused {
                bump(&mut self.high_risk_over_permission_frequency, permission);
            }
        }
    }

    /// Combine two partial summaries.
    pub fn merge(&mut self, other: &CorpusSummary) {
        self.packages_processed += other.packages_processed;
        self.packages_analyzed += other.packages_analyzed;
        self.packages_errored += other.packages_errored;
        self.over_permissioned_packages += other.over_permissioned_packages;
        self.high_risk_packages += other.high_risk_packages;
        self.wasm_packages += other.wasm_packages;
        self.api_frequency.merge(&other.api_frequency);

        for (kind, n) in &other.errors_by_kind {
            *self.errors_by_kind.entry(*kind).or_insert(0) += n;
        }
        for (kind, n) in &other.file_issues_by_kind {
            *self.file_issues_by_kind.entry(*kind).or_insert(0) += n;
        }
        merge_counts(&mut self.over_permission_frequency, &other.over_permission_frequency);
        merge_counts(
            &mut self.high_risk_over_permission_frequency,
            &other.high_risk_over_permission_frequency,
        );
        merge_counts(&mut self.declared_permission_frequency, &other.declared_permission_frequency);
        merge_counts(
            &mut self.unrecognized_permission_frequency,
            &other.unrecognized_permission_frequency,
        );
    }

    pub fn category_totals(&self) -> BTreeMap<String, u64> {
        self.api_frequency
            .categories()
            .map(|(category, apis)| (category.to_string(), apis.values().sum()))
            .collect()
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn merge_counts(into: &mut BTreeMap<String, usize>, from: &BTreeMap<String, usize>) {
    for (key, n) in from {
        *into.entry(key.clone()).or_insert(0) += n;
    }
}

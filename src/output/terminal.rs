use crate::corpus::CorpusReport;
use crate::models::PackageAnalysisResult;
use colored::*;
use std::collections::BTreeMap;

const TOP_N: usize = 10;

pub fn print_package_result(result: &PackageAnalysisResult) {
    print_header(result);

    if let Some(ref failure) = result.error {
        println!("  {} {:16} {}", "✖".red(), failure.kind.as_str().red().bold(), failure.message);
        println!();
        return;
    }

    print_permissions_section(result);
    print_evidence_section(result);
    print_file_issues_section(result);
}

fn print_header(result: &PackageAnalysisResult) {
    println!("{}", "┌─────────────────────────────────────────────────────────────┐".bright_black());

    let manifest = result.manifest.as_ref();
    let name = manifest
        .and_then(|m| m.name.as_deref())
        .unwrap_or("Unknown Extension");
    println!("│  Extension: {:<48}│", name.bold());
    println!("│  Package: {:<50}│", result.package);

    let version = manifest.and_then(|m| m.version.as_deref()).unwrap_or("?");
    let manifest_v = manifest
        .and_then(|m| m.manifest_version)
        .map(|v| format!("Manifest V{}", v))
        .unwrap_or_else(|| "?".to_string());
    let files = format!(
        "{} scripts ({} lexical)",
        result.files.scanned, result.files.lexical
    );
    println!("│  Version: {} │ {} │ {:<26}│", version, manifest_v, files);
    println!("{}", "└─────────────────────────────────────────────────────────────┘".bright_black());
    println!();
}

fn print_permissions_section(result: &PackageAnalysisResult) {
    let (Some(manifest), Some(verdict)) = (&result.manifest, &result.verdict) else {
        return;
    };

    if manifest.all_declared_permissions.is_empty() {
        return;
    }

    println!("{}", "── Permissions ──────────────────────────────────────────────".bright_black());

    for permission in &verdict.confirmed_used {
        println!("  {} {:10} {}", "✔".green(), "used".green(), permission);
    }
    for permission in &verdict.over_permissioned {
        if verdict.high_risk_unused.contains(permission) {
            println!("  {} {:10} {} {}", "⚠".red(), "unused".red().bold(), permission, "(high risk)".red());
        } else {
            println!("  {} {:10} {}", "⚠".yellow(), "unused".yellow().bold(), permission);
        }
    }
    for permission in manifest.host_permissions() {
        println!("  {} {:10} {}", "●".blue(), "host".blue(), permission);
    }
    for permission in manifest.unrecognized_permissions() {
        println!("  {} {:10} {}", "ℹ".bright_black(), "unknown".bright_black(), permission);
    }

    println!();
}

fn print_evidence_section(result: &PackageAnalysisResult) {
    if result.evidence.is_empty() && result.api_counts.is_empty() && !result.has_wasm {
        return;
    }

    println!("{}", "── Evidence ─────────────────────────────────────────────────".bright_black());

    for pattern in result.evidence.iter() {
        println!("  {} {}", "→".bright_black(), pattern.cyan());
    }
    for (category, apis) in result.api_counts.categories() {
        let total: u64 = apis.values().sum();
        println!("    {:<20} {}", category, total.to_string().bold());
    }
    if result.has_wasm {
        println!("  {} {}", "●".blue(), "contains WebAssembly".blue());
    }

    println!();
}

fn print_file_issues_section(result: &PackageAnalysisResult) {
    if result.file_issues.is_empty() {
        return;
    }

    println!("{}", "── File Issues ──────────────────────────────────────────────".bright_black());

    for issue in &result.file_issues {
        println!("  {} {:16} {}", "ℹ".bright_black(), issue.kind.as_str(), issue.message.bright_black());
    }

    println!();
}

pub fn print_corpus_report(report: &CorpusReport) {
    let summary = &report.summary;

    println!("{}", "══ Corpus Summary ═══════════════════════════════════════════".bright_black());
    println!();
    println!("  Processed:           {}", summary.packages_processed.to_string().bold());
    println!("  Analysed:            {}", summary.packages_analyzed);
    println!("  Errored:             {}", summary.packages_errored);
    if report.cancelled > 0 {
        println!("  Cancelled:           {}", report.cancelled.to_string().yellow());
    }
    println!(
        "  Over-permissioned:   {}",
        summary.over_permissioned_packages.to_string().yellow().bold()
    );
    println!("  High risk unused:    {}", summary.high_risk_packages.to_string().red().bold());
    println!("  With WebAssembly:    {}", summary.wasm_packages);
    println!();

    if !summary.errors_by_kind.is_empty() {
        println!("{}", "── Errors ───────────────────────────────────────────────────".bright_black());
        for (kind, n) in &summary.errors_by_kind {
            println!("  {:<20} {}", kind.as_str(), n.to_string().red());
        }
        println!();
    }

    print_frequency("Unused Permissions", &summary.over_permission_frequency);
    print_frequency("Unused High-Risk Permissions", &summary.high_risk_over_permission_frequency);
    print_frequency("Unrecognised Permissions", &summary.unrecognized_permission_frequency);

    let totals = summary.category_totals();
    if !totals.is_empty() {
        println!("{}", "── API Categories ───────────────────────────────────────────".bright_black());
        for (category, total) in &totals {
            println!("  {:<20} {}", category, total.to_string().bold());
        }
        println!();
    }
}

fn print_frequency(title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }

    println!("{}", format!("── {} ", title).bright_black());
    for (permission, n) in top_entries(counts, TOP_N) {
        println!("  {:<32} {}", permission, n.to_string().yellow());
    }
    println!();
}

/// Highest counts first, ties broken by key.
fn top_entries(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(n);
    entries
}

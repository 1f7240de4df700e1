use super::CorpusSummary;
use crate::analyze::PackageScanner;
use crate::error::PackageError;
use crate::models::PackageAnalysisResult;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinError;
use tracing::{info, warn};

/// One package handed to the corpus runner.
#[derive(Debug, Clone)]
pub enum PackageInput {
    Path(PathBuf),
    Bytes { label: String, data: Vec<u8> },
}

impl PackageInput {
    pub fn label(&self) -> String {
        match self {
            PackageInput::Path(path) => path.display().to_string(),
            PackageInput::Bytes { label, .. } => label.clone(),
        }
    }
}

impl From<PathBuf> for PackageInput {
    fn from(path: PathBuf) -> Self {
        PackageInput::Path(path)
    }
}

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    /// Packages analysed at once.
    pub workers: usize,
    /// Per-package deadline. `None` waits forever.
    pub package_timeout: Option<Duration>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            package_timeout: Some(Duration::from_secs(120)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusReport {
    pub summary: CorpusSummary,
    /// In completion order.
    pub results: Vec<PackageAnalysisResult>,
    /// Packages never folded in because the run was cancelled.
    pub cancelled: usize,
}

/// Analyse every input on a bounded worker pool and reduce the results.
pub async fn run_corpus(
    inputs: Vec<PackageInput>,
    scanner: Arc<PackageScanner>,
    options: CorpusOptions,
) -> CorpusReport {
    let (_never, cancel) = watch::channel(false);
    run_corpus_until(inputs, scanner, options, cancel).await
}

/// Like [`run_corpus`], stopping early once `cancel` turns `true`.
///
/// Results of packages still in flight at that point are discarded whole.
pub async fn run_corpus_until(
    inputs: Vec<PackageInput>,
    scanner: Arc<PackageScanner>,
    options: CorpusOptions,
    mut cancel: watch::Receiver<bool>,
) -> CorpusReport {
    let total = inputs.len();
    let workers = options.workers.max(1);
    let timeout = options.package_timeout;
    info!("analysing {} packages with {} workers", total, workers);

    // A timed-out scan keeps its permit until the blocking task really ends.
    let slots = Arc::new(Semaphore::new(workers));
    let mut pending = stream::iter(inputs.into_iter().map(|input| {
        let scanner = Arc::clone(&scanner);
        scan_one(scanner, input, timeout, Arc::clone(&slots))
    }))
    .buffer_unordered(workers);

    let mut report = CorpusReport::default();
    loop {
        tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancel) => {
                warn!("corpus run cancelled");
                break;
            }
            next = pending.next() => match next {
                Some(result) => {
                    report.summary.record(&result);
                    report.results.push(result);
                }
                None => break,
            },
        }
    }

    report.cancelled = total - report.summary.packages_processed;
    info!(
        "processed {} packages ({} analysed, {} errored, {} cancelled)",
        report.summary.packages_processed,
        report.summary.packages_analyzed,
        report.summary.packages_errored,
        report.cancelled
    );
    report
}

async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        // Sender gone without cancelling: never fires.
        std::future::pending::<()>().await;
    }
}

async fn scan_one(
    scanner: Arc<PackageScanner>,
    input: PackageInput,
    timeout: Option<Duration>,
    slots: Arc<Semaphore>,
) -> PackageAnalysisResult {
    let label = input.label();
    let permit = match slots.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            let err = PackageError::Worker(e.to_string());
            warn!("{}: {}", label, err);
            return PackageAnalysisResult::failed(label, &err);
        }
    };

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        match input {
            PackageInput::Path(path) => scanner.scan_path_within(&path, timeout),
            PackageInput::Bytes { label, data } => scanner.scan_bytes_within(&label, &data, timeout),
        }
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                let err = PackageError::Timeout(limit);
                warn!("{}: {}", label, err);
                return PackageAnalysisResult::failed(label, &err);
            }
        },
        None => task.await,
    };

    settle(label, joined)
}

/// Turn a finished worker into a result; a panicked scan becomes a worker error.
fn settle(label: String, joined: Result<PackageAnalysisResult, JoinError>) -> PackageAnalysisResult {
    match joined {
        Ok(result) => result,
        Err(e) => {
            let err = PackageError::Worker(e.to_string());
            warn!("{}: {}", label, err);
            PackageAnalysisResult::failed(label, &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::PermissionCatalog;
    use crate::error::ErrorKind;

    fn scanner() -> Arc<PackageScanner> {
        Arc::new(PackageScanner::new(Arc::new(PermissionCatalog::builtin())))
    }

    #[tokio::test]
    async fn test_panicked_worker_is_an_error_result() {
        let joined = tokio::task::spawn_blocking(|| -> PackageAnalysisResult { panic!("boom") }).await;
        let result = settle("crash.zip".to_string(), joined);

        assert_eq!(result.package, "crash.zip");
        assert_eq!(result.error_kind(), Some(ErrorKind::Worker));

        let summary = CorpusSummary::from_results(std::slice::from_ref(&result));
        assert_eq!(summary.packages_errored, 1);
        assert_eq!(summary.errors_by_kind.get(&ErrorKind::Worker), Some(&1));
    }

    #[tokio::test]
    async fn test_scan_waits_for_a_free_slot() {
        let slots = Arc::new(Semaphore::new(1));
        let held = Arc::clone(&slots).acquire_owned().await.unwrap();
        let input = PackageInput::Bytes {
            label: "junk.zip".to_string(),
            data: b"not an archive".to_vec(),
        };

        let waiting = tokio::time::timeout(
            Duration::from_millis(50),
            scan_one(scanner(), input.clone(), None, Arc::clone(&slots)),
        )
        .await;
        assert!(waiting.is_err());

        drop(held);
        let result = scan_one(scanner(), input, None, Arc::clone(&slots)).await;
        assert!(result.is_error());
        assert_eq!(slots.available_permits(), 1);
    }
}

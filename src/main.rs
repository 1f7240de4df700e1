use anyhow::{Result, bail};
use clap::Parser;
use extperm::Config;
use extperm::analyze::PackageScanner;
use extperm::corpus::{PackageInput, run_corpus_until};
use extperm::input::collect_packages;
use extperm::output::{print_corpus_report, print_package_result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "extperm")]
#[command(about = "Find browser extensions that declare permissions their code never uses")]
struct Args {
    /// Extension packages (.zip, .crx, .xpi) or directories containing them
    #[arg(required_unless_present = "init_config")]
    inputs: Vec<String>,

    /// Config file
    #[arg(long, default_value = "extperm.toml")]
    config: PathBuf,

    /// Permission catalog (TOML or JSON), overrides the config file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Packages analysed at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-package timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Print a starter config file and exit
    #[arg(long)]
    init_config: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        print!("{}", Config::starter_toml());
        return Ok(());
    }

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(&args.config)?;
    if let Some(path) = args.catalog {
        config.catalog.path = Some(path);
    }
    if let Some(jobs) = args.jobs {
        config.corpus.workers = Some(jobs);
    }
    if let Some(secs) = args.timeout {
        config.corpus.package_timeout_secs = secs;
    }

    let catalog = Arc::new(config.build_catalog()?);
    let scanner = Arc::new(PackageScanner::new(catalog).with_limits(config.scan));

    let packages = collect_packages(&args.inputs)?;
    if packages.is_empty() {
        bail!("no extension packages found");
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let options = config.corpus.options();
    tracing::debug!("workers={} timeout={:?}", options.workers, options.package_timeout);
    let inputs = packages.into_iter().map(PackageInput::from).collect();
    let report = run_corpus_until(inputs, scanner, options, cancel_rx).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            print_package_result(result);
        }
        print_corpus_report(&report);
    }

    Ok(())
}

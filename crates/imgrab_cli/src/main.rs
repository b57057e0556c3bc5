//! `imgrab` — download every image referenced by a web page.

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use url::Url;

use imgrab_engine::{
    ensure_download_dir, BatchOutcome, DirectorySink, FetchSettings, ImagePipeline,
    ImgTagExtractor, PipelineError, ReqwestFetcher, DEFAULT_WORKER_SLOTS,
};

#[derive(Debug, Parser)]
#[command(
    name = "imgrab",
    about = "Download every image referenced by a web page",
    version
)]
struct Cli {
    /// Page to scan for image references.
    #[arg(value_parser = parse_page_url)]
    url: Url,

    /// Worker slots shared by the page fetch and the image downloads.
    #[arg(long, default_value_t = DEFAULT_WORKER_SLOTS)]
    workers: usize,

    /// Directory receiving the images (defaults to the platform temp dir).
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Log debug detail.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_page_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|err| err.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.verbose);

    let download_dir = cli.dir.clone().unwrap_or_else(std::env::temp_dir);
    if let Err(err) = ensure_download_dir(&download_dir) {
        eprintln!("imgrab error: {err}");
        return ExitCode::FAILURE;
    }

    let runtime = match build_runtime(cli.workers.max(1)) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("imgrab error: could not start worker pool: {err}");
            return ExitCode::FAILURE;
        }
    };

    let fetcher = match ReqwestFetcher::new(FetchSettings::default()) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(err) => {
            eprintln!("imgrab error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = ImagePipeline::new(
        fetcher,
        Arc::new(ImgTagExtractor),
        Arc::new(DirectorySink::new(download_dir.clone())),
        cli.workers.max(1),
    );

    let outcome = runtime.block_on(pipeline.run(&cli.url));
    report(outcome, &download_dir);

    // The pool is torn down only after the terminal outcome is known.
    drop(runtime);
    log::info!("worker pool shut down");
    ExitCode::SUCCESS
}

fn build_runtime(workers: usize) -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name_fn(|| {
            static NEXT_WORKER: AtomicUsize = AtomicUsize::new(0);
            let id = NEXT_WORKER.fetch_add(1, Ordering::Relaxed);
            format!("imgrab-worker-{id}")
        })
        .enable_all()
        .build()
}

/// Terminal handler: every failure ends here as a report, never as a
/// propagated error.
fn report(outcome: Result<BatchOutcome, PipelineError>, dir: &Path) {
    match outcome {
        Ok(batch) if batch.all_succeeded() => {
            log::info!(
                "stored {} images in {}",
                batch.completed.len(),
                dir.display()
            );
        }
        Ok(batch) => {
            for failure in &batch.failed {
                log::warn!("{}: {}", failure.target, failure.error);
            }
            log::warn!(
                "stored {} of {} images in {} ({} failed)",
                batch.completed.len(),
                batch.task_count(),
                dir.display(),
                batch.failed.len()
            );
        }
        Err(err) => log::error!("pipeline failed: {err}"),
    }
}

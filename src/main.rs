use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mutant_detector::server::{self, AppState};
use mutant_detector::{utils, Args, SnapshotLog};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    let workers = utils::worker_count(args.workers);
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("Failed to configure detector thread pool")?;

    let stats_file = args.stats_file.clone().unwrap_or_else(utils::default_stats_path);
    info!(action = "start", component = "main", workers, stats_file = ?stats_file, "Starting mutant detector");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        let state = AppState::new(SnapshotLog::new(stats_file));
        server::serve(&args.host, args.port, state).await
    });

    if let Err(e) = &result {
        error!(action = "exit", component = "main", error = %e, "Server exited with error");
    }
    result
}

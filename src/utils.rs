use std::env;
use std::path::PathBuf;
use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::EnvFilter;

pub const STATS_FILE_NAME: &str = "Stats.csv";

/// Resolves the local UTC offset, so it must run before any other thread is
/// spawned (the tokio runtime included).
pub fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .init();
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
    }

    if let Some(path) = &args.stats_file {
        if path.as_os_str().is_empty() {
            anyhow::bail!("--stats-file must not be empty");
        }
    }

    Ok(())
}

pub fn worker_count(requested: Option<usize>) -> usize {
    requested.unwrap_or_else(|| {
        let cpu_count = num_cpus::get();
        std::cmp::min(cpu_count, 8)
    })
}

/// `Stats.csv` beside the running executable, or in the working directory
/// when the executable path is unavailable.
pub fn default_stats_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(STATS_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(STATS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use clap::Parser;

    #[test]
    fn rejects_zero_workers() {
        let args = Args::parse_from(["mutant-detector", "--workers", "0"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn accepts_defaults() {
        let args = Args::parse_from(["mutant-detector"]);
        assert_eq!(args.port, 3000);
        assert_eq!(args.host, "0.0.0.0");
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn worker_count_is_capped() {
        assert_eq!(worker_count(Some(3)), 3);
        let default = worker_count(None);
        assert!((1..=8).contains(&default));
    }

    #[test]
    fn default_stats_path_ends_with_file_name() {
        assert!(default_stats_path().ends_with(STATS_FILE_NAME));
    }
}

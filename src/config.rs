//! Worker configuration.
//!
//! Every option is a CLI flag with an environment fallback. A malformed
//! storage limit is rejected by clap before the worker starts.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use regex::Regex;

use crate::error::AppError;

/// Repository downloader - keeps local clones in sync with tracked branches
#[derive(Debug, Parser)]
#[command(name = "repo-downloader")]
#[command(about = "Keeps local clones of remote repositories in sync with a tracked branch", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print per-commit statistics of a local repository as JSON lines
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Path to the working copy or bare repository
    #[arg(value_name = "REPO_PATH")]
    pub repo_path: PathBuf,

    /// Skip commits committed before this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<chrono::NaiveDate>,

    /// Stop at the first commit committed after this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<chrono::NaiveDate>,

    /// Check out every visited revision
    #[arg(long)]
    pub checkout: bool,

    /// Count inserted and deleted lines (defaults to --commits-diff)
    #[arg(long)]
    pub diff: bool,
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Root directory holding the local repositories
    #[arg(long, env = "GIT_REPOSITORY_DIR", default_value = "./repositories")]
    pub repository_dir: PathBuf,

    /// Storage limit for the repository root, e.g. "5 GB"
    #[arg(long, env = "GIT_STORAGE_LIMIT")]
    pub storage_limit: Option<StorageLimit>,

    /// Count inserted and deleted lines when walking history
    #[arg(long, env = "GIT_COMMITS_DIFF")]
    pub commits_diff: bool,

    /// Reserved for a multi-worker mode; a single job runs at a time
    #[arg(long, env = "GIT_MAX_PARALLEL_CLONES", default_value_t = 1)]
    pub max_parallel_clones: usize,

    /// Reserved for a multi-worker mode; a single job runs at a time
    #[arg(long, env = "GIT_MAX_PARALLEL_REPO_PROCESSORS", default_value_t = 1)]
    pub max_parallel_repo_processors: usize,

    /// Base URL of the job source; polling is disabled when unset
    #[arg(long, env = "JOB_URL")]
    pub job_url: Option<String>,

    /// Job type requested from the job source
    #[arg(long, env = "JOB_TYPE", default_value_t = 1)]
    pub job_type: i32,

    /// Worker name reported to the job source
    #[arg(long, env = "POD_NAME", default_value = "repo-downloader")]
    pub pod_name: String,

    /// Seconds between two polls of the job source
    #[arg(long, env = "JOB_POLL_INTERVAL_SECS", default_value_t = 30)]
    pub poll_interval_secs: u64,

    /// Address to bind the HTTP trigger to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to run the HTTP trigger on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}

static STORAGE_LIMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?<count>\d+)\s*(?<unit>[A-Za-z]+)\s*$").expect("valid storage limit pattern")
});

/// A byte count written as `"<integer> <unit>"` with 1024-based units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLimit(u64);

impl StorageLimit {
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for StorageLimit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = STORAGE_LIMIT_PATTERN
            .captures(s)
            .ok_or_else(|| AppError::Config(format!("invalid storage limit format: {:?}", s)))?;

        let count: u64 = caps["count"]
            .parse()
            .map_err(|_| AppError::Config(format!("storage limit count out of range: {:?}", s)))?;

        let multiplier: u64 = match caps["unit"].to_lowercase().as_str() {
            "kb" => 1024,
            "mb" => 1024 * 1024,
            "gb" => 1024 * 1024 * 1024,
            "tb" => 1024 * 1024 * 1024 * 1024,
            unit => return Err(AppError::Config(format!("unsupported storage unit: {}", unit))),
        };

        count
            .checked_mul(multiplier)
            .map(StorageLimit)
            .ok_or_else(|| AppError::Config(format!("storage limit overflows: {:?}", s)))
    }
}

impl fmt::Display for StorageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_limit_units_are_1024_based() {
        assert_eq!("5 GB".parse::<StorageLimit>().unwrap().bytes(), 5 * 1024 * 1024 * 1024);
        assert_eq!("10kb".parse::<StorageLimit>().unwrap().bytes(), 10 * 1024);
        assert_eq!("3 Mb".parse::<StorageLimit>().unwrap().bytes(), 3 * 1024 * 1024);
        assert_eq!("1 tb".parse::<StorageLimit>().unwrap().bytes(), 1 << 40);
    }

    #[test]
    fn storage_limit_rejects_unknown_unit() {
        let err = "5 xb".parse::<StorageLimit>().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("xb")));
    }

    #[test]
    fn storage_limit_rejects_malformed_input() {
        assert!("".parse::<StorageLimit>().is_err());
        assert!("GB".parse::<StorageLimit>().is_err());
        assert!("-5 GB".parse::<StorageLimit>().is_err());
        assert!("5.5 GB".parse::<StorageLimit>().is_err());
        assert!("99999999999999999999 tb".parse::<StorageLimit>().is_err());
    }

    #[test]
    fn cli_fails_fast_on_bad_storage_limit() {
        let result = Cli::try_parse_from(["repo-downloader", "--storage-limit", "5 xb"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["repo-downloader", "--storage-limit", "2 gb"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config.storage_limit.unwrap().bytes(), 2 * 1024 * 1024 * 1024);
        assert_eq!(cli.config.job_type, 1);
        assert_eq!(cli.config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn cli_stats_subcommand() {
        let cli = Cli::try_parse_from([
            "repo-downloader",
            "stats",
            "/tmp/repo",
            "--from",
            "2024-01-01",
            "--diff",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Stats(args)) => {
                assert_eq!(args.repo_path, PathBuf::from("/tmp/repo"));
                assert_eq!(args.from, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
                assert!(args.to.is_none());
                assert!(args.diff);
                assert!(!args.checkout);
            }
            None => panic!("expected stats subcommand"),
        }
    }
}

use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use executorobs::executor::DEFAULT_THREAD_NAME_PREFIX;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Service configuration. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Request deadline
    pub timeout_millis: u64,

    /// Worker count, fixed at 1
    pub worker_pool_size: usize,

    /// Drain wait on process stop
    pub shutdown_grace_seconds: u64,

    pub thread_name_prefix: String,

    /// Answer timeouts and failures with an empty 200
    pub legacy_empty_response: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_millis: 85_000,
            worker_pool_size: 1,
            shutdown_grace_seconds: 30,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            legacy_empty_response: false,
        }
    }
}

/// Command line overrides, applied on top of the config file.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// JSON config file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    #[clap(long)]
    pub timeout_millis: Option<u64>,

    #[clap(long)]
    pub worker_pool_size: Option<usize>,

    #[clap(long)]
    pub shutdown_grace_seconds: Option<u64>,

    #[clap(long)]
    pub thread_name_prefix: Option<String>,

    #[clap(long)]
    pub legacy_empty_response: bool,
}

impl Config {
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Defaults, then the config file if given, then flags.
    pub fn load(args: &ConfigArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(timeout_millis) = args.timeout_millis {
            config.timeout_millis = timeout_millis;
        }
        if let Some(worker_pool_size) = args.worker_pool_size {
            config.worker_pool_size = worker_pool_size;
        }
        if let Some(shutdown_grace_seconds) = args.shutdown_grace_seconds {
            config.shutdown_grace_seconds = shutdown_grace_seconds;
        }
        if let Some(prefix) = &args.thread_name_prefix {
            config.thread_name_prefix = prefix.clone();
        }
        if args.legacy_empty_response {
            config.legacy_empty_response = true;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_pool_size != 1 {
            return Err(ConfigError::Invalid(format!(
                "worker_pool_size must be 1, got {}",
                self.worker_pool_size
            )));
        }
        if self.timeout_millis == 0 {
            return Err(ConfigError::Invalid("timeout_millis must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

//! Layered configuration.
//!
//! Precedence from lowest to highest:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config FILE`, or `config.toml` in the platform config
//!    directory when it exists)
//! 3. `DUPSIFT_*` environment variables, nested keys split on `__`
//! 4. command-line flags, applied with [`Config::apply_scan_args`]
//!
//! ```toml
//! top = 5
//! fast = true
//! method = "thorough"
//! algorithm = "sha256"
//! min_size = 4096
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, ScanArgs};
use crate::duplicates::{default_io_threads, Method, PipelineConfig};
use crate::progress::DEFAULT_MIN_INTERVAL;
use crate::scanner::{HashAlgorithm, WalkerConfig};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "DUPSIFT_";

/// Errors raised while assembling the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `--config` named a file that does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or holds a bad value
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The merged configuration could not be rendered as TOML
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective settings for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Groups targeted by fast mode and shown by the report; 0 means all
    pub top: usize,
    /// Apply keep-caps between stages
    pub fast: bool,
    /// Stage sequence
    pub method: Method,
    /// Include hidden entries
    pub hidden: bool,
    /// Include zero-length files
    pub empty: bool,
    /// Smallest file considered, in bytes
    pub min_size: u64,
    /// Content digest algorithm
    pub algorithm: HashAlgorithm,
    /// Hashing threads
    pub io_threads: usize,
    /// Send deletions to the trash
    pub trash: bool,
    /// Output format
    pub output: OutputFormat,
    /// Minimum delay between progress redraws
    pub progress_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top: 3,
            fast: false,
            method: Method::default(),
            hidden: false,
            empty: false,
            min_size: 1,
            algorithm: HashAlgorithm::default(),
            io_threads: default_io_threads(),
            trash: false,
            output: OutputFormat::default(),
            progress_interval_ms: DEFAULT_MIN_INTERVAL.as_millis() as u64,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` does not exist and
    /// [`ConfigError::Invalid`] if any layer is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// Provider stack without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` does not exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    log::debug!("Using config file {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract a configuration from any provider stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if extraction fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Overlay explicitly given scan flags.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if args.all {
            self.top = 0;
        } else if let Some(top) = args.top {
            self.top = top;
        }
        self.fast |= args.fast;
        if let Some(method) = args.method {
            self.method = method;
        }
        self.hidden |= args.hidden;
        self.empty |= args.empty;
        if let Some(min_size) = args.min_size {
            self.min_size = min_size;
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        self.trash |= args.trash;
        if let Some(output) = args.output {
            self.output = output;
        }
    }

    /// Group limit, `None` when unlimited.
    #[must_use]
    pub fn top_limit(&self) -> Option<usize> {
        (self.top > 0).then_some(self.top)
    }

    /// Listing settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        let min_size = if self.empty { 0 } else { self.min_size };
        WalkerConfig::default()
            .with_hidden(self.hidden)
            .with_min_size(min_size)
    }

    /// Stage settings.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_top(self.top_limit())
            .with_fast(self.fast)
            .with_method(self.method)
            .with_algorithm(self.algorithm)
            .with_io_threads(self.io_threads)
    }

    /// Progress redraw interval.
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Platform config file location, e.g. `~/.config/dupsift/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dupsift").map(|dirs| dirs.config_dir().join("config.toml"))
}

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::reference::{reference_count, REFERENCES_PER_PAGE};

/// A full configuration file: the sweep, and optionally how to log it
///
/// ```
/// use pagesim::config::Config;
/// let json = r#"{ "ram_size": 16, "process_count": 10, "process_size": 32, "logging": { "level": "debug" } }"#;
/// let config = Config::from_reader(json.as_bytes()).unwrap();
/// assert_eq!(config.sweep.max_page_size(), 16);
/// assert_eq!(config.logging.level, "debug");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses and validates a JSON configuration
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Config = serde_json::from_reader(reader)?;
        config.sweep.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// The parameters of one sweep over page sizes
///
/// Sizes are in arbitrary but shared units; a page size divides both the RAM and the process into
/// frames and pages
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct SweepConfig {
    pub ram_size: usize,
    pub process_count: usize,
    pub process_size: usize,
    /// The reference string of a process is this many times its page count
    #[serde(default = "default_references_per_page")]
    pub references_per_page: usize,
    /// Seeds every reference string. Without one, each sweep draws a fresh seed
    #[serde(default)]
    pub seed: Option<u64>,
    /// The number of threads the processes of each page size are split over
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Runs the four policies of a process on their own threads
    #[serde(default = "default_parallel_policies")]
    pub parallel_policies: bool,
}

fn default_references_per_page() -> usize {
    REFERENCES_PER_PAGE
}

fn default_workers() -> usize {
    1
}

fn default_parallel_policies() -> bool {
    true
}

impl SweepConfig {
    pub fn new(ram_size: usize, process_count: usize, process_size: usize) -> Self {
        Self {
            ram_size,
            process_count,
            process_size,
            references_per_page: default_references_per_page(),
            seed: None,
            workers: default_workers(),
            parallel_policies: default_parallel_policies(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_references_per_page(mut self, references_per_page: usize) -> Self {
        self.references_per_page = references_per_page;
        self
    }

    pub fn with_parallel_policies(mut self, parallel_policies: bool) -> Self {
        self.parallel_policies = parallel_policies;
        self
    }

    /// The largest page size swept, page sizes above it leave either the RAM or the process
    /// without a single whole page
    pub fn max_page_size(&self) -> usize {
        self.ram_size.min(self.process_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(Error::InvalidConfig("the process count must be at least 1".to_string()));
        }
        if self.references_per_page == 0 {
            return Err(Error::InvalidConfig("references per page must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("at least one worker is required".to_string()));
        }
        // Page size 1 gives the most pages, one per unit of the process
        if self.max_page_size() > 0 {
            reference_count(self.process_size, self.references_per_page)?;
        }
        Ok(())
    }
}

/// Logging configuration. The RUST_LOG environment variable takes precedence over the level
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_timestamps() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            timestamps: default_timestamps(),
        }
    }
}

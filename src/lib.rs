//! cloudlens: a terminal dashboard for browsing AWS and GCP resources.
//!
//! This library provides:
//! - An alias store mapping short mnemonics (`ec2`, `s3`, `iam:u`) to resource ids
//! - A command router dispatching typed commands onto a navigation stack
//! - A viewer registry turning resource ids into view components
//! - A generic table viewer with per-view key actions and background refresh
//! - A ratatui front end driving all of the above
//!
//! # Example
//!
//! ```no_run
//! use cloudlens::{catalog, Config, DataSources, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> cloudlens::LensResult<()> {
//! let config = Config::load("./data")?;
//! let router = catalog::compose(&config, Session::default(), DataSources::new(), CancellationToken::new())?;
//! router.run("ec2", "", true)?;
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod session;
pub mod source;
pub mod view;

pub use crate::alias::{Alias, AliasStore, Origin};
pub use crate::error::{LensError, LensResult};
pub use crate::session::{Cloud, Session};
pub use crate::source::{Column, DataSource, DataSources, FixtureSource, Row, StaticSource};
pub use crate::view::{Component, Dispatch, NavigationStack, Router, Table, ViewContext, ViewerRegistry};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional config file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Seconds between background refresh ticks
    pub refresh_rate_secs: u64,
    /// Upper bound on the tick spacing after repeated fetch failures
    pub max_backoff_ticks: u32,
    /// Seconds a status message stays visible
    pub status_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            refresh_rate_secs: 20,
            max_backoff_ticks: 8,
            status_ttl_secs: 5,
        }
    }
}

impl Config {
    /// Read `config.toml` from `data_dir` if present; defaults otherwise
    pub fn load(data_dir: impl Into<PathBuf>) -> LensResult<Self> {
        let data_dir = data_dir.into();
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str::<Config>(&raw)?
        } else {
            Config::default()
        };
        config.data_dir = data_dir;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LensResult<()> {
        if self.refresh_rate_secs == 0 {
            return Err(LensError::Configuration(
                "refresh_rate_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_secs(self.refresh_rate_secs)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn aliases_file(&self) -> PathBuf {
        self.data_dir.join("aliases.toml")
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.data_dir.join("fixtures")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("cloudlens.log")
    }

    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join(".cloudlens_history")
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> LensResult<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

/// Platform data directory, or `./data` when none can be determined
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "cloudlens", "cloudlens")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

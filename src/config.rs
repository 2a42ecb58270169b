//! Relay configuration.
//!
//! Settings come from an optional TOML file and `DECKGAUGE_*` environment
//! variables, in that order of precedence (environment wins):
//!
//! ```toml
//! pipe_name = "ab2sd-1"
//! tick_interval_ms = 250
//! producer_application = "MSIAfterburner.exe"
//! catalog = "dynamic"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::catalog::CatalogKind;
use crate::connection::{ConnectionSettings, Connector, PipeConnector};
use crate::error::Result;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DECKGAUGE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the producer's IPC channel.
    pub pipe_name: String,
    /// Directory holding the producer socket (Unix only).
    pub pipe_dir: Option<PathBuf>,
    /// Supervisor tick period.
    pub tick_interval_ms: u64,
    /// Upper bound on one connect attempt.
    pub connect_timeout_ms: u64,
    /// Size of each read; one read is one payload.
    pub read_buffer_size: usize,
    /// Application whose start/stop edges mark producer availability.
    pub producer_application: String,
    /// Treat the producer as running before any lifecycle edge arrives.
    pub assume_producer_running: bool,
    /// Measurement-type catalog flavour.
    pub catalog: CatalogKind,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pipe_name: "ab2sd-1".to_string(),
            pipe_dir: None,
            tick_interval_ms: 250,
            connect_timeout_ms: 1000,
            read_buffer_size: 64 * 1024,
            producer_application: "MSIAfterburner.exe".to_string(),
            assume_producer_running: false,
            catalog: CatalogKind::Basic,
        }
    }
}

impl RelayConfig {
    /// Load from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_buffer_size: self.read_buffer_size,
        }
    }

    /// The pipe connector described by this configuration.
    pub fn connector(&self) -> Arc<dyn Connector> {
        match &self.pipe_dir {
            Some(dir) => Arc::new(PipeConnector::with_dir(dir)),
            None => Arc::new(PipeConnector::new()),
        }
    }
}

use std::path::PathBuf;

use serde::Deserialize;

use skytrack_common::{Unit, Versioned};

use crate::{PoolConfig, DEF_NEAREST, POINT_TOPIC};

/// Configuration file format
///
/// ```hcl
/// version  = 1
/// stations = "/var/lib/skytrack/vors.csv"
/// nearest  = 2
/// unit     = "nm"
///
/// pool {
///   workers = 2
///   queue   = 64
///   timeout = "10s"
/// }
/// ```
///
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Usual check for malformed file
    pub version: usize,
    /// Topic new points are published on
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Station dataset (CSV)
    pub stations: Option<PathBuf>,
    /// Restrict stations to this state
    pub state: Option<String>,
    /// How many stations are sent to clients
    #[serde(default = "default_nearest")]
    pub nearest: usize,
    /// Unit for distances
    #[serde(default)]
    pub unit: Unit,
    /// Background workers
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_topic() -> String {
    POINT_TOPIC.to_string()
}

fn default_nearest() -> usize {
    DEF_NEAREST
}

impl Versioned for EngineConfig {
    const CVERSION: usize = 1;

    fn version(&self) -> usize {
        self.version
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            version: Self::CVERSION,
            topic: default_topic(),
            stations: None,
            state: None,
            nearest: DEF_NEAREST,
            unit: Unit::default(),
            pool: PoolConfig::default(),
        }
    }
}

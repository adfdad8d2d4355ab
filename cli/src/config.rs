//! Optional config file (`--config abicodec.yaml`). Flags override it.
//!
//! ```yaml
//! codec:
//!   address_padding: strict
//!   bool_encoding: lenient
//!   max_depth: 32
//! registry:
//!   schemas: ./schemas
//!   duplicate_policy: keep_first
//! log:
//!   level: info
//!   json: false
//! ```

use abicodec_core::config::CodecConfig;
use abicodec_observability::LogConfig;
use abicodec_registry::DuplicatePolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub codec: CodecConfig,
    pub registry: RegistrySettings,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Schema file or directory used when a command gets no `--schemas`
    pub schemas: Option<PathBuf>,
    pub duplicate_policy: DuplicatePolicy,
}

impl CliConfig {
    /// Read a YAML (or JSON, a YAML subset) config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parse config file '{}'", path.display()))
    }
}

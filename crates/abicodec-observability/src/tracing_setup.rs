//! Tracing / logging initialisation helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: crate name → level, e.g. `abicodec-registry: debug`
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Raise the global level by `verbosity` steps above the configured one
    /// (`-v` → info, `-vv` → debug, `-vvv` → trace when starting from warn).
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if verbosity > 0 {
            let base = LEVELS
                .iter()
                .position(|l| l.eq_ignore_ascii_case(&self.level))
                .unwrap_or(1);
            let idx = (base + verbosity as usize).min(LEVELS.len() - 1);
            self.level = LEVELS[idx].to_string();
        }
        self
    }

    /// The `EnvFilter` directive string, e.g. `"warn,abicodec_registry=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber. Call once at startup; a second call
/// returns an error and leaves the first subscriber in place.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_components() {
        let mut config = LogConfig::default();
        config
            .components
            .insert("abicodec-registry".into(), "debug".into());
        config.components.insert("abicodec-evm".into(), "trace".into());
        assert_eq!(
            config.directives(),
            "warn,abicodec_evm=trace,abicodec_registry=debug"
        );
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(LogConfig::default().with_verbosity(0).level, "warn");
        assert_eq!(LogConfig::default().with_verbosity(1).level, "info");
        assert_eq!(LogConfig::default().with_verbosity(2).level, "debug");
        assert_eq!(LogConfig::default().with_verbosity(9).level, "trace");
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config.level, "warn");
        assert!(config.json);
    }

    #[test]
    fn second_init_fails() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}

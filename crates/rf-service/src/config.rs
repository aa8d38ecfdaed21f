use serde::Deserialize;
use std::path::Path;

/// Service configuration (SPEC_FULL.md §4.7), loaded once at startup from
/// TOML. Every field is defaulted so a missing or partial file still
/// produces a complete configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,
    #[serde(default = "defaults::num_streams")]
    pub num_streams: usize,
    #[serde(default = "defaults::memory_cleanup_interval_secs")]
    pub memory_cleanup_interval_secs: u64,
    #[serde(default = "defaults::memory_cleanup_threshold")]
    pub memory_cleanup_threshold: f64,
    #[serde(default = "defaults::log_requests")]
    pub log_requests: bool,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::allow_gpu_fallback")]
    pub allow_gpu_fallback: bool,
}

mod defaults {
    pub fn bind_address() -> String {
        "127.0.0.1:5555".into()
    }
    pub fn num_streams() -> usize {
        4
    }
    pub fn memory_cleanup_interval_secs() -> u64 {
        300
    }
    pub fn memory_cleanup_threshold() -> f64 {
        0.8
    }
    pub fn log_requests() -> bool {
        true
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn allow_gpu_fallback() -> bool {
        false
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind_address: defaults::bind_address(),
            num_streams: defaults::num_streams(),
            memory_cleanup_interval_secs: defaults::memory_cleanup_interval_secs(),
            memory_cleanup_threshold: defaults::memory_cleanup_threshold(),
            log_requests: defaults::log_requests(),
            log_level: defaults::log_level(),
            allow_gpu_fallback: defaults::allow_gpu_fallback(),
        }
    }
}

/// Errors loading [`ServiceConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

impl ServiceConfig {
    /// Load from a TOML file. A present-but-malformed file is a hard
    /// error; a missing file is the caller's concern (use
    /// [`ServiceConfig::default`] for "no file at all").
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        let config: ServiceConfig = toml::from_str(&text)?;
        Ok(config)
    }

    /// Load from `path` if it exists, falling back to defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServiceConfig::load_or_default("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:5555");
        assert_eq!(config.num_streams, 4);
    }

    #[test]
    fn partial_file_fills_in_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bind_address = \"0.0.0.0:9999\"\n").unwrap();
        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9999");
        assert_eq!(config.num_streams, 4);
        assert!((config.memory_cleanup_threshold - 0.8).abs() < 1e-9);
    }

    #[test]
    fn malformed_file_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml :::").unwrap();
        assert!(matches!(ServiceConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(ServiceConfig::load(&path), Err(ConfigError::Read { .. })));
    }
}

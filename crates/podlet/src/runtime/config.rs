//! Runtime manager configuration.

use std::path::{Path, PathBuf};

use podlet_common::{PodletPaths, PodletResult};
use serde::{Deserialize, Serialize};

/// Runtime manager configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime-type tag used in composite container IDs.
    pub runtime_name: String,
    /// Whether to enforce CPU limits with CFS quota.
    pub cpu_cfs_quota: bool,
    /// Paths for container logs.
    pub paths: PodletPaths,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_name: "remote".to_string(),
            cpu_cfs_quota: true,
            paths: PodletPaths::new(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from TOML; missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is malformed.
    pub fn from_toml_str(s: &str) -> PodletResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> PodletResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;

        tracing::debug!(
            path = %path.display(),
            runtime = %config.runtime_name,
            "Loaded runtime config"
        );

        Ok(config)
    }

    /// Set the runtime-type tag.
    #[must_use]
    pub fn with_runtime_name(mut self, name: impl Into<String>) -> Self {
        self.runtime_name = name.into();
        self
    }

    /// Enable or disable CFS quota enforcement.
    #[must_use]
    pub const fn with_cpu_cfs_quota(mut self, enabled: bool) -> Self {
        self.cpu_cfs_quota = enabled;
        self
    }

    /// Set the container log root.
    #[must_use]
    pub fn with_pod_logs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = PodletPaths::with_pod_logs_root(root);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.runtime_name, "remote");
        assert!(config.cpu_cfs_quota);
    }

    #[test]
    fn builder_pattern() {
        let config = RuntimeConfig::default()
            .with_runtime_name("docker")
            .with_cpu_cfs_quota(false)
            .with_pod_logs_root("/custom/logs");

        assert_eq!(config.runtime_name, "docker");
        assert!(!config.cpu_cfs_quota);
        assert_eq!(config.paths.pod_logs_root, PathBuf::from("/custom/logs"));
    }

    #[test]
    fn partial_toml_takes_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            runtime_name = "docker"

            [paths]
            pod_logs_root = "/srv/logs"
            "#,
        )
        .unwrap();

        assert_eq!(config.runtime_name, "docker");
        assert!(config.cpu_cfs_quota);
        assert_eq!(config.paths.pod_logs_root, PathBuf::from("/srv/logs"));
    }

    #[test]
    fn load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("podlet.toml");
        std::fs::write(&path, "cpu_cfs_quota = false\n").unwrap();

        let config = RuntimeConfig::load(&path).unwrap();
        assert!(!config.cpu_cfs_quota);
        assert!(RuntimeConfig::load(temp.path().join("missing.toml")).is_err());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = RuntimeConfig::from_toml_str("cpu_cfs_quota = \"maybe\"").unwrap_err();
        assert!(matches!(err, podlet_common::PodletError::Config { .. }));
    }
}

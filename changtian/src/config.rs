//! Tool configuration.
//!
//! Settings are read from `.changtian.toml` in the project root, or from the
//! file given with `--config`. Every field is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! android_home = "${env:HOME}/android-sdk"
//! buildozer = "buildozer"
//! command_timeout_secs = 1800
//! build_log = "build.log"
//! spec_file = "buildozer.spec"
//! apk_dirs = ["bin", ".buildozer/android/platform/build/dists", "."]
//!
//! [env]
//! JAVA_HOME = "/usr/lib/jvm/java-17-openjdk-amd64"
//! ```
//!
//! `${env:VAR}` placeholders are expanded when the file is loaded.
//! `${projectFolder}` is expanded to the project root when paths are used.

use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::replace_env_placeholders;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".changtian.toml";

/// SDK location used when nothing else is configured; the path of the
/// preinstalled SDK on GitHub-hosted runners.
pub const DEFAULT_ANDROID_HOME: &str = "/home/runner/android-sdk";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Android SDK root. `ANDROID_HOME` from the environment takes precedence.
    pub android_home: Option<String>,
    /// Buildozer program name or path.
    pub buildozer: String,
    /// Upper bound for every external command, in seconds.
    pub command_timeout_secs: u64,
    /// Build log analysed when no APK is found, relative to the project.
    pub build_log: String,
    /// Spec file used by `spec` commands, relative to the project.
    pub spec_file: String,
    /// Directories searched recursively for APKs, relative to the project.
    pub apk_dirs: Vec<String>,
    /// Extra environment variables for Buildozer commands.
    pub env: HashMap<String, String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            android_home: None,
            buildozer: "buildozer".to_string(),
            command_timeout_secs: 1800,
            build_log: "build.log".to_string(),
            spec_file: buildspec::DEFAULT_FILE_NAME.to_string(),
            apk_dirs: vec![
                "bin".to_string(),
                ".buildozer/android/platform/build/dists".to_string(),
                ".".to_string(),
            ],
            env: HashMap::new(),
        }
    }
}

impl ToolConfig {
    /// Parses configuration text after expanding `${env:VAR}` placeholders.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let content = replace_env_placeholders(content);
        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("can not open config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// The command timeout as a [`Duration`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// JSON schema of the configuration file.
    pub fn schema_json() -> anyhow::Result<String> {
        let schema = schemars::schema_for!(ToolConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ToolConfig::from_toml("command_timeout_secs = 60\n").unwrap();
        assert_eq!(config.command_timeout(), Duration::from_secs(60));
        assert_eq!(config.buildozer, "buildozer");
        assert_eq!(config.spec_file, "buildozer.spec");
        assert_eq!(config.apk_dirs.len(), 3);
        assert!(config.android_home.is_none());
    }

    #[test]
    fn test_env_placeholders_and_extra_env() {
        unsafe {
            std::env::set_var("CT_CONFIG_SDK", "/opt/sdk");
        }
        let config = ToolConfig::from_toml(
            "android_home = \"${env:CT_CONFIG_SDK}\"\n[env]\nJAVA_HOME = \"/jdk\"\n",
        )
        .unwrap();
        assert_eq!(config.android_home.as_deref(), Some("/opt/sdk"));
        assert_eq!(config.env["JAVA_HOME"], "/jdk");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(ToolConfig::from_toml("command_timeout_secs = \"soon\"\n").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ToolConfig::load(&tmp.path().join(CONFIG_FILE_NAME))
            .await
            .unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = ToolConfig::schema_json().unwrap();
        assert!(schema.contains("command_timeout_secs"));
        assert!(schema.contains("apk_dirs"));
    }
}

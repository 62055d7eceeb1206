//! Application context and state management.
//!
//! This module provides the [`AppContext`] type which holds the state shared
//! by every command: the project root, the tool configuration and the
//! resolved Android SDK location.

use std::{
    env,
    path::{Path, PathBuf},
};

use buildspec::{APP, Document};

use crate::config::{CONFIG_FILE_NAME, DEFAULT_ANDROID_HOME, ToolConfig};

/// Path configuration grouping all path-related fields.
#[derive(Default, Clone, Debug)]
pub struct PathConfig {
    /// Project root; every relative path is resolved against it.
    pub project: PathBuf,
    /// Configuration file that was loaded, if it existed.
    pub config_file: Option<PathBuf>,
}

impl PathConfig {
    /// Directory where finished APKs are collected.
    pub fn bin_dir(&self) -> PathBuf {
        self.project.join("bin")
    }

    /// Resolves `path` against the project root unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project.join(path)
        }
    }
}

/// Where the Android SDK path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkSource {
    /// `ANDROID_HOME` environment variable.
    Environment,
    /// `android_home` in the tool configuration.
    Config,
    /// `android.sdk_dir` in the spec file.
    SpecFile,
    /// Built-in default.
    Default,
}

/// The main application context holding all state.
#[derive(Default, Clone, Debug)]
pub struct AppContext {
    /// Path configuration for project and config file.
    pub paths: PathConfig,
    /// Loaded tool configuration.
    pub config: ToolConfig,
    /// Android SDK root used for every build step.
    pub android_home: PathBuf,
}

impl AppContext {
    /// Builds the context for `project`.
    ///
    /// The configuration is read from `config_path`, or from
    /// `.changtian.toml` in the project root. The SDK location is taken from
    /// `ANDROID_HOME`, the configuration, the spec file's `android.sdk_dir`,
    /// or the built-in default, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing configuration file cannot be parsed.
    pub async fn new(project: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = config_path.unwrap_or_else(|| project.join(CONFIG_FILE_NAME));
        let config = ToolConfig::load(&config_path).await?;

        let mut ctx = Self {
            paths: PathConfig {
                project,
                config_file: config_path.exists().then_some(config_path),
            },
            config,
            android_home: PathBuf::new(),
        };

        let (home, source) = ctx.resolve_android_home(env::var("ANDROID_HOME").ok());
        debug!("Android SDK: {} ({source:?})", home.display());
        ctx.android_home = home;
        Ok(ctx)
    }

    /// Picks the SDK root given the value of `ANDROID_HOME`.
    pub fn resolve_android_home(&self, from_env: Option<String>) -> (PathBuf, SdkSource) {
        if let Some(home) = from_env.filter(|s| !s.trim().is_empty()) {
            return (PathBuf::from(home), SdkSource::Environment);
        }
        if let Some(home) = &self.config.android_home {
            return (self.path_with_vars(home), SdkSource::Config);
        }
        if let Some(home) = self.spec_sdk_dir() {
            return (self.path_with_vars(&home), SdkSource::SpecFile);
        }
        (PathBuf::from(DEFAULT_ANDROID_HOME), SdkSource::Default)
    }

    fn spec_sdk_dir(&self) -> Option<String> {
        let doc = Document::load(self.spec_path(None)).ok()?;
        doc.get_non_empty(APP, "android.sdk_dir")
            .map(|s| s.trim().to_string())
    }

    /// The spec file to operate on: `explicit` if given, else the
    /// configured one.
    pub fn spec_path(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => self.paths.resolve(path),
            None => self.path_with_vars(&self.config.spec_file),
        }
    }

    /// Build log path from the configuration.
    pub fn build_log_path(&self) -> PathBuf {
        self.path_with_vars(&self.config.build_log)
    }

    /// Directories searched for APKs.
    pub fn apk_dirs(&self) -> Vec<PathBuf> {
        self.config
            .apk_dirs
            .iter()
            .map(|d| self.path_with_vars(d))
            .collect()
    }

    fn path_with_vars(&self, value: &str) -> PathBuf {
        self.paths.resolve(self.value_replace_with_var(value))
    }

    /// Creates a new command builder for the given program.
    ///
    /// The command runs in the project root with the configured timeout
    /// and `${projectFolder}` substitution.
    pub fn command(&self, program: &str) -> crate::utils::Command {
        let project = self.paths.project.clone();
        let mut cmd = crate::utils::Command::new(program, &self.paths.project, move |s| {
            replace_project_var(&project, s)
        });
        cmd.timeout(self.config.command_timeout());
        cmd
    }

    /// Creates a Buildozer command.
    ///
    /// `ANDROID_HOME` and `ANDROID_SDK_ROOT` point at the resolved SDK and
    /// the configured extra variables are applied.
    pub fn buildozer(&self) -> crate::utils::Command {
        let mut cmd = self.command(&self.value_replace_with_var(&self.config.buildozer));
        let home = self.android_home.display().to_string();
        cmd.env("ANDROID_HOME", &home);
        cmd.env("ANDROID_SDK_ROOT", &home);
        for (k, v) in &self.config.env {
            cmd.env(k, v);
        }
        cmd
    }

    /// Replaces variable placeholders in a string.
    ///
    /// Currently supports `${projectFolder}` which is replaced with the
    /// project directory path.
    pub fn value_replace_with_var<S>(&self, value: S) -> String
    where
        S: AsRef<std::ffi::OsStr>,
    {
        replace_project_var(&self.paths.project, value.as_ref())
    }
}

fn replace_project_var(project: &Path, value: &std::ffi::OsStr) -> String {
    value
        .to_string_lossy()
        .replace("${projectFolder}", &project.display().to_string())
}

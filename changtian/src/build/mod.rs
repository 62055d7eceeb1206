//! Android packaging workflow.
//!
//! Three steps, each exposed as a CLI command and meant to run in sequence
//! on a CI runner:
//!
//! - [`AppContext::setup_environment`] checks the Android SDK, makes `aidl`
//!   usable, points Buildozer's private SDK location at it and verifies that
//!   Buildozer runs
//! - [`AppContext::run_build`] cleans and builds a debug APK
//! - [`AppContext::check_result`] looks for the produced APKs, and analyses
//!   the build log when there are none

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use colored::Colorize;

use crate::{
    build::{
        buildozer::BuildozerBuilder,
        report::{LogAnalysis, collect_into, find_apks},
        sdk::AndroidSdk,
    },
    ctx::AppContext,
    utils::{copy_dir_all, make_executable},
};

/// Buildozer command builder.
pub mod buildozer;

/// APK discovery and build log analysis.
pub mod report;

/// Android SDK inspection.
pub mod sdk;

/// How the Buildozer SDK location was made to point at the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkLink {
    Symlinked,
    Copied,
    /// The location already resolves to the SDK.
    AlreadyThere,
}

impl AppContext {
    /// Prepares the build environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK is missing or unusable, or if Buildozer
    /// does not run. Failing to link the SDK into Buildozer's directory is
    /// only logged.
    pub async fn setup_environment(&self) -> anyhow::Result<()> {
        println!("{}", "Setting up build environment".bold());

        let bin_dir = self.paths.bin_dir();
        fs::create_dir_all(&bin_dir)
            .with_context(|| format!("failed to create {}", bin_dir.display()))?;

        let sdk = self.check_android_sdk().context("environment setup failed")?;

        match buildozer_sdk_dir() {
            Some(link) => match link_sdk(sdk.android_home(), &link) {
                Ok(how) => println!(
                    "{} {} -> {} ({how:?})",
                    "✓".green(),
                    link.display(),
                    sdk.android_home().display()
                ),
                Err(e) => warn!("Failed to link SDK into {}: {e:#}", link.display()),
            },
            None => warn!("Home directory unknown, skipping Buildozer SDK link"),
        }

        self.validate_environment(&sdk)
            .await
            .context("environment setup failed")?;

        println!("{}", "✓ Build environment ready".green());
        Ok(())
    }

    fn check_android_sdk(&self) -> anyhow::Result<AndroidSdk> {
        let sdk = AndroidSdk::new(&self.android_home)?;
        println!(
            "{} Android SDK: {}",
            "✓".green(),
            sdk.android_home().display()
        );

        let tools = sdk.build_tools()?;
        if tools.is_empty() {
            bail!(
                "no build-tools installed in {}; install build-tools first",
                sdk.android_home().display()
            );
        }
        let versions: Vec<_> = tools.iter().map(|t| t.version.as_str()).collect();
        println!("{} build-tools: {}", "✓".green(), versions.join(", "));

        if let Some(aidl) = AndroidSdk::find_aidl(&tools) {
            make_executable(&aidl)
                .with_context(|| format!("failed to chmod {}", aidl.display()))?;
            println!("{} aidl: {}", "✓".green(), aidl.display());
            return Ok(sdk);
        }

        warn!("aidl not in build-tools, searching the whole SDK");
        let found = sdk.search_aidl()?;
        if found.is_empty() {
            bail!("aidl not found; make sure build-tools are installed correctly");
        }
        for path in &found {
            println!("{} aidl: {}", "✓".green(), path.display());
        }
        Ok(sdk)
    }

    async fn validate_environment(&self, sdk: &AndroidSdk) -> anyhow::Result<()> {
        let output = self
            .buildozer()
            .arg("--version")
            .output()
            .await
            .context("Buildozer is not installed")?;
        if !output.status.success() {
            bail!("Buildozer is not installed correctly ({})", output.status);
        }
        let version = String::from_utf8_lossy(&output.stdout);
        println!("{} Buildozer: {}", "✓".green(), version.trim());

        if !sdk.android_home().is_dir() {
            bail!("Android SDK disappeared: {}", sdk.android_home().display());
        }
        if sdk.latest_build_tools()?.is_none() {
            bail!("no build-tools installed");
        }
        Ok(())
    }

    /// Cleans previous output, then builds a debug APK.
    ///
    /// A failing clean is only logged. Returns whether the build succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if Buildozer cannot be started or times out.
    pub async fn run_build(&self) -> anyhow::Result<bool> {
        println!("{}", "Building APK".bold());

        match BuildozerBuilder::clean(self).status().await {
            Ok(status) if !status.success() => warn!("Clean failed ({status}), continuing"),
            Ok(_) => {}
            Err(e) => warn!("Clean failed: {e:#}"),
        }

        let status = BuildozerBuilder::debug(self).verbose(true).status().await?;
        if status.success() {
            println!("{}", "✓ Build finished".green());
        } else {
            println!("{}", format!("✗ Build failed ({status})").red());
        }
        Ok(status.success())
    }

    /// Reports built APKs and collects them into `bin/`.
    ///
    /// Returns `false` when no APK exists; the build log is analysed then.
    pub fn check_result(&self) -> anyhow::Result<bool> {
        println!("{}", "Checking build result".bold());

        let apks = find_apks(&self.apk_dirs())?;
        if apks.is_empty() {
            println!("{}", "✗ Build failed: no APK found".red());
            self.print_log_analysis(&self.build_log_path())?;
            return Ok(false);
        }

        let bin_dir = self.paths.bin_dir();
        for apk in &apks {
            println!(
                "{} {} ({})",
                "✓".green(),
                self.display_path(&apk.path).display(),
                apk.size_display()
            );
            debug!("found under {}", apk.found_in.display());
            if let Some(dest) = collect_into(apk, &bin_dir)? {
                info!("Copied to {}", self.display_path(&dest).display());
            }
        }

        println!("{}", format!("✓ Build succeeded: {} APK(s)", apks.len()).green());
        Ok(true)
    }

    fn print_log_analysis(&self, log: &Path) -> anyhow::Result<()> {
        if !log.exists() {
            println!("No build log at {}", log.display());
            return Ok(());
        }

        let analysis = LogAnalysis::from_file(log)
            .with_context(|| format!("failed to read {}", log.display()))?;
        if analysis.is_empty() {
            println!("Nothing suspicious in {}", log.display());
            return Ok(());
        }

        let sections = [
            ("AIDL related", &analysis.aidl),
            ("License related", &analysis.license),
            ("Errors", &analysis.errors),
        ];
        for (title, lines) in sections {
            if lines.is_empty() {
                continue;
            }
            println!("{}", format!("{title}:").yellow().bold());
            for line in lines {
                println!("  {line}");
            }
        }
        Ok(())
    }

    fn display_path<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.paths.project).unwrap_or(path)
    }
}

/// `~/.buildozer/android/platform/android-sdk`
fn buildozer_sdk_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".buildozer/android/platform/android-sdk"))
}

/// Makes `link` refer to `sdk`, replacing whatever is there.
///
/// A symlink is tried first; when that fails the SDK is copied. Nothing is
/// touched when `link` already resolves to `sdk`.
///
/// # Errors
///
/// Returns an error if `link` is a directory containing `sdk`.
pub fn link_sdk(sdk: &Path, link: &Path) -> io::Result<SdkLink> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }

    let sdk_real = fs::canonicalize(sdk)?;
    if fs::canonicalize(link).is_ok_and(|real| real == sdk_real) {
        return Ok(SdkLink::AlreadyThere);
    }

    if let Ok(meta) = fs::symlink_metadata(link) {
        if meta.is_dir() {
            if sdk_real.starts_with(fs::canonicalize(link)?) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} contains the SDK itself", link.display()),
                ));
            }
            fs::remove_dir_all(link)?;
        } else {
            fs::remove_file(link)?;
        }
    }

    match symlink_dir(sdk, link) {
        Ok(()) => Ok(SdkLink::Symlinked),
        Err(e) => {
            debug!("symlink failed ({e}), copying SDK instead");
            copy_dir_all(sdk, link)?;
            Ok(SdkLink::Copied)
        }
    }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

//! Spec file commands: check, show, get and set.

use std::path::{Path, PathBuf};

use anyhow::Context;
use buildspec::{BuildozerSpec, Document, Report, Severity};
use colored::Colorize;

use crate::ctx::AppContext;

impl AppContext {
    fn load_spec(&self, file: Option<&Path>) -> anyhow::Result<(PathBuf, Document)> {
        let path = self.spec_path(file);
        let doc = Document::load(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((path, doc))
    }

    /// Lints the spec file and prints every finding.
    ///
    /// Returns `false` if any finding is an error.
    pub fn spec_check(&self, file: Option<&Path>) -> anyhow::Result<bool> {
        let (path, doc) = self.load_spec(file)?;
        let report = buildspec::lint(&doc);
        print_report(&path, &report);
        Ok(!report.has_errors())
    }

    /// Prints the recognised keys, as a summary or as JSON.
    pub fn spec_show(&self, file: Option<&Path>, json: bool) -> anyhow::Result<()> {
        let (_, doc) = self.load_spec(file)?;
        let spec = BuildozerSpec::from_document(&doc);
        if json {
            println!("{}", serde_json::to_string_pretty(&spec)?);
        } else {
            print!("{}", summary(&spec));
        }
        Ok(())
    }

    /// Prints the raw value of `[section] key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not present.
    pub fn spec_get(&self, section: &str, key: &str, file: Option<&Path>) -> anyhow::Result<()> {
        let (path, doc) = self.load_spec(file)?;
        let Some(value) = doc.get(section, key) else {
            bail!("[{section}] {key} not found in {}", path.display());
        };
        println!("{value}");
        Ok(())
    }

    /// Sets `[section] key = value` and writes the file back.
    ///
    /// Formatting and comments of untouched lines are preserved. A missing
    /// file is created.
    pub fn spec_set(
        &self,
        section: &str,
        key: &str,
        value: &str,
        file: Option<&Path>,
    ) -> anyhow::Result<()> {
        let path = self.spec_path(file);
        let mut doc = if path.exists() {
            Document::load(&path).with_context(|| format!("failed to load {}", path.display()))?
        } else {
            Document::parse("")?
        };

        let old = doc.get(section, key).map(str::to_string);
        doc.set(section, key, value)?;
        doc.save(&path)?;

        match old {
            Some(old) => info!("[{section}] {key}: {old} -> {value}"),
            None => info!("[{section}] {key} = {value}"),
        }
        Ok(())
    }
}

fn print_report(path: &Path, report: &Report) {
    for diag in &report.diagnostics {
        let text = diag.to_string();
        match diag.severity {
            Severity::Error => println!("{}", text.red()),
            Severity::Warning => println!("{}", text.yellow()),
        }
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    if report.is_clean() {
        println!("{} {}", "✓".green(), path.display());
    } else if errors == 0 {
        println!("{} {}: {warnings} warning(s)", "✓".green(), path.display());
    } else {
        println!(
            "{}",
            format!(
                "✗ {}: {errors} error(s), {warnings} warning(s)",
                path.display()
            )
            .red()
        );
    }
}

fn summary(spec: &BuildozerSpec) -> String {
    fn opt<T: ToString>(v: &Option<T>) -> String {
        v.as_ref().map_or_else(|| "-".to_string(), T::to_string)
    }

    let app = &spec.app;
    let android = &app.android;
    let archs: Vec<String> = android.archs.iter().map(ToString::to_string).collect();

    let mut out = String::new();
    let mut line = |name: &str, value: String| {
        out += &format!("{name:<20}{value}\n");
    };
    line("title", opt(&app.title));
    line("package", spec.package_id().unwrap_or_else(|| "-".to_string()));
    line("version", opt(&app.version));
    line("entry point", opt(&app.source_main));
    line("requirements", app.requirements.join(", "));
    line("orientation", opt(&app.orientation));
    line("android.api", opt(&android.api));
    line("android.minapi", opt(&android.minapi));
    line("android.ndk", opt(&android.ndk));
    line("android.archs", archs.join(", "));
    line("build-tools", opt(&android.build_tools));
    line("permissions", android.permissions.join(", "));
    line("sdk_dir", opt(&android.sdk_dir));
    line("skip_download", opt(&android.skip_download));
    line("log_level", opt(&spec.buildozer.log_level));
    out
}

//! Validation rules for spec files.
//!
//! Errors are problems Buildozer will reject or silently misread. Warnings
//! flag combinations that have broken CI builds before: an SDK download
//! that was skipped without a local SDK path, licenses not accepted for a
//! pre-installed SDK, or an architecture list that is ignored.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{APP, BUILDOZER, document::Document, parse_bool, spec::Arch, split_list};

static NDK_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^r?\d+[a-z]?$").expect("static regex is valid"));
static DOTTED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("static regex is valid"));
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex is valid"));
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("static regex is valid")
});

const REQUIRED_KEYS: [&str; 4] = ["title", "package.name", "package.domain", "source.main"];

const BOOL_KEYS: [(&str, &str); 5] = [
    (APP, "android.allow_backup"),
    (APP, "android.skip_download"),
    (APP, "android.accept_sdk_license"),
    (BUILDOZER, "warn_on_root"),
    (BUILDOZER, "buildozer.parallel_build"),
];

const ORIENTATIONS: [&str; 6] = [
    "portrait",
    "landscape",
    "portrait-reverse",
    "landscape-reverse",
    "all",
    "sensor",
];

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// One lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub section: String,
    /// Empty for section-level findings.
    pub key: String,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: [{}]", self.section)?;
        if !self.key.is_empty() {
            write!(f, " {}", self.key)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// All findings for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

struct Linter<'a> {
    doc: &'a Document,
    out: Vec<Diagnostic>,
}

impl<'a> Linter<'a> {
    fn push(&mut self, severity: Severity, section: &str, key: &str, message: String) {
        self.out.push(Diagnostic {
            severity,
            section: section.to_string(),
            key: key.to_string(),
            line: self.doc.line_of(section, key),
            message,
        });
    }

    fn error(&mut self, section: &str, key: &str, message: impl Into<String>) {
        self.push(Severity::Error, section, key, message.into());
    }

    fn warn(&mut self, section: &str, key: &str, message: impl Into<String>) {
        self.push(Severity::Warning, section, key, message.into());
    }

    fn get(&self, section: &str, key: &str) -> Option<&'a str> {
        self.doc.get_non_empty(section, key).map(str::trim)
    }

    fn required(&mut self) {
        for key in REQUIRED_KEYS {
            match self.doc.get(APP, key) {
                None => self.error(APP, key, "required key is missing"),
                Some(v) if v.trim().is_empty() => self.error(APP, key, "required key is empty"),
                Some(_) => {}
            }
        }
    }

    fn api_level(&mut self, key: &str) -> Option<u32> {
        let value = self.get(APP, key)?;
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                self.error(APP, key, format!("`{value}` is not a positive API level"));
                None
            }
        }
    }

    fn versions(&mut self) {
        let api = self.api_level("android.api");
        let minapi = self.api_level("android.minapi");
        if let (Some(api), Some(minapi)) = (api, minapi) {
            if minapi > api {
                self.warn(
                    APP,
                    "android.minapi",
                    format!("minimum API {minapi} is above target API {api}"),
                );
            }
        }

        if let Some(ndk) = self.get(APP, "android.ndk") {
            if !NDK_VERSION.is_match(ndk) {
                self.error(
                    APP,
                    "android.ndk",
                    format!("`{ndk}` is not an NDK version like `25b`"),
                );
            }
        }

        if let Some(tools) = self.get(APP, "android.build_tools") {
            if !DOTTED_VERSION.is_match(tools) {
                self.error(
                    APP,
                    "android.build_tools",
                    format!("`{tools}` is not a version like `33.0.2`"),
                );
            }
        }
    }

    fn booleans(&mut self) {
        for (section, key) in BOOL_KEYS {
            if let Some(value) = self.get(section, key) {
                if parse_bool(value).is_none() {
                    self.error(section, key, format!("`{value}` is not a boolean"));
                }
            }
        }
    }

    fn archs(&mut self) {
        let has_archs = self.get(APP, "android.archs").is_some();
        if has_archs && self.get(APP, "android.arch").is_some() {
            self.warn(
                APP,
                "android.arch",
                "ignored because `android.archs` is also set",
            );
        }

        let key = if has_archs {
            "android.archs"
        } else {
            "android.arch"
        };
        for arch in self.doc.get_list(APP, key) {
            if let Ok(Arch::Other(name)) = arch.parse::<Arch>() {
                self.warn(APP, key, format!("unknown architecture `{name}`"));
            }
        }
    }

    fn sdk(&mut self) {
        let skip = self
            .get(APP, "android.skip_download")
            .and_then(parse_bool)
            .unwrap_or(false);
        if !skip {
            return;
        }

        if self.get(APP, "android.sdk_dir").is_none() {
            self.warn(
                APP,
                "android.skip_download",
                "download is skipped but `android.sdk_dir` is not set",
            );
        }

        let accepted = self
            .get(APP, "android.accept_sdk_license")
            .and_then(parse_bool)
            .unwrap_or(false);
        if !accepted {
            self.warn(
                APP,
                "android.accept_sdk_license",
                "a pre-installed SDK usually needs `android.accept_sdk_license = True`",
            );
        }
    }

    fn package(&mut self) {
        if let Some(name) = self.get(APP, "package.name") {
            if !IDENTIFIER.is_match(name) {
                self.warn(
                    APP,
                    "package.name",
                    format!("`{name}` is not a valid identifier"),
                );
            }
        }
        if let Some(domain) = self.get(APP, "package.domain") {
            if !DOMAIN.is_match(domain) {
                self.warn(
                    APP,
                    "package.domain",
                    format!("`{domain}` is not a dotted identifier"),
                );
            }
        }
    }

    fn orientation(&mut self) {
        let Some(value) = self.get(APP, "orientation") else {
            return;
        };
        for item in split_list(value) {
            if !ORIENTATIONS.contains(&item.as_str()) {
                self.warn(APP, "orientation", format!("unknown orientation `{item}`"));
            }
        }
    }

    fn log_level(&mut self) {
        if let Some(value) = self.get(BUILDOZER, "log_level") {
            if !matches!(value, "0" | "1" | "2") {
                self.error(BUILDOZER, "log_level", format!("`{value}` is not 0, 1 or 2"));
            }
        }
    }

    fn sections(&mut self) {
        if !self.doc.has_section(APP) {
            self.error(APP, "", "section is missing");
        }
        if !self.doc.has_section(BUILDOZER) {
            self.warn(BUILDOZER, "", "section is missing");
        }
    }
}

/// Checks `doc` against the known rules.
pub fn lint(doc: &Document) -> Report {
    let mut linter = Linter {
        doc,
        out: Vec::new(),
    };

    linter.sections();
    linter.required();
    linter.versions();
    linter.booleans();
    linter.archs();
    linter.sdk();
    linter.package();
    linter.orientation();
    linter.log_level();

    Report {
        diagnostics: linter.out,
    }
}

//! # buildspec
//!
//! Reader, linter and editor for `buildozer.spec` files.
//!
//! A spec file is an INI-style document with an `[app]` and a `[buildozer]`
//! section. Buildozer reads it once at build time to decide how an
//! application is packaged for Android.
//!
//! ## Quick Start
//!
//! ```rust
//! use buildspec::{BuildozerSpec, Document, lint};
//!
//! let text = "[app]\ntitle = Demo\npackage.name = demo\npackage.domain = org.test\n\
//!             source.main = main.py\nandroid.archs = armeabi-v7a,arm64-v8a\n\n\
//!             [buildozer]\nlog_level = 2\n";
//!
//! let mut doc = Document::parse(text).unwrap();
//! assert!(!lint(&doc).has_errors());
//!
//! let spec = BuildozerSpec::from_document(&doc);
//! assert_eq!(spec.package_id().as_deref(), Some("org.test.demo"));
//!
//! doc.set("app", "android.api", "33").unwrap();
//! assert_eq!(doc.get("app", "android.api"), Some("33"));
//! ```
//!
//! ## Modules
//!
//! - [`document`] - Lossless INI document model
//! - [`spec`] - Typed view over the recognised keys
//! - [`lint`] - Validation rules
//! - [`error`] - Error types and result definitions

/// Lossless INI document model.
pub mod document;

/// Error types and result definitions.
pub mod error;

/// Validation rules.
pub mod lint;

/// Typed view over the recognised keys.
pub mod spec;

pub use document::{Document, EntryRef};
pub use error::{Result, SpecError};
pub use lint::{Diagnostic, Report, Severity, lint};
pub use spec::{AndroidSection, AppSection, Arch, BuildozerSection, BuildozerSpec};

/// Name of the application section.
pub const APP: &str = "app";

/// Name of the tool section.
pub const BUILDOZER: &str = "buildozer";

/// Default spec file name.
pub const DEFAULT_FILE_NAME: &str = "buildozer.spec";

/// Parses a boolean the way Buildozer's config reader does.
///
/// Accepts `1/yes/true/on` and `0/no/false/off`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Splits a comma-separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

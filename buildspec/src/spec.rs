//! Typed view over the keys Buildozer recognises.
//!
//! The view is lenient: booleans and integers that do not parse read as
//! absent here and are reported by [`crate::lint`] instead.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::{APP, BUILDOZER, document::Document, parse_bool};

/// Android ABI targeted by a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    ArmeabiV7a,
    Arm64V8a,
    X86,
    X86_64,
    /// Anything Buildozer does not know about.
    Other(String),
}

impl Arch {
    /// All ABIs python-for-android can build for.
    pub const KNOWN: [Arch; 4] = [Arch::ArmeabiV7a, Arch::Arm64V8a, Arch::X86, Arch::X86_64];

    pub fn as_str(&self) -> &str {
        match self {
            Arch::ArmeabiV7a => "armeabi-v7a",
            Arch::Arm64V8a => "arm64-v8a",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Arch::Other(_))
    }
}

impl FromStr for Arch {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "armeabi-v7a" => Arch::ArmeabiV7a,
            "arm64-v8a" => Arch::Arm64V8a,
            "x86" => Arch::X86,
            "x86_64" => Arch::X86_64,
            other => Arch::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Arch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Android-specific keys of the `[app]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidSection {
    pub permissions: Vec<String>,
    /// Target API level.
    pub api: Option<u32>,
    /// Minimum supported API level.
    pub minapi: Option<u32>,
    /// NDK version, e.g. `25b`.
    pub ndk: Option<String>,
    /// From `android.archs`, or the legacy single `android.arch`.
    pub archs: Vec<Arch>,
    /// Build-tools version, e.g. `33.0.2`.
    pub build_tools: Option<String>,
    pub allow_backup: Option<bool>,
    pub presplash_color: Option<String>,
    /// Use a pre-installed SDK instead of downloading one.
    pub skip_download: Option<bool>,
    pub accept_sdk_license: Option<bool>,
    pub sdk_dir: Option<String>,
    pub sdk_manager: Option<String>,
}

/// The `[app]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppSection {
    pub title: Option<String>,
    pub package_name: Option<String>,
    pub package_domain: Option<String>,
    pub version: Option<String>,
    pub source_dir: Option<String>,
    pub source_main: Option<String>,
    pub requirements: Vec<String>,
    pub orientation: Option<String>,
    pub android: AndroidSection,
}

/// The `[buildozer]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildozerSection {
    /// 0 = errors only, 1 = info, 2 = debug.
    pub log_level: Option<u8>,
    pub warn_on_root: Option<bool>,
    pub cache_dir: Option<String>,
    pub parallel_build: Option<bool>,
}

/// Typed view of a whole spec file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildozerSpec {
    pub app: AppSection,
    pub buildozer: BuildozerSection,
}

fn string(doc: &Document, section: &str, key: &str) -> Option<String> {
    doc.get_non_empty(section, key).map(str::to_string)
}

fn boolean(doc: &Document, section: &str, key: &str) -> Option<bool> {
    doc.get(section, key).and_then(parse_bool)
}

fn number<T: FromStr>(doc: &Document, section: &str, key: &str) -> Option<T> {
    doc.get(section, key).and_then(|v| v.trim().parse().ok())
}

impl BuildozerSpec {
    /// Extracts the recognised keys from `doc`.
    pub fn from_document(doc: &Document) -> Self {
        let archs = match doc.get_non_empty(APP, "android.archs") {
            Some(_) => doc.get_list(APP, "android.archs"),
            None => doc.get_list(APP, "android.arch"),
        };

        let android = AndroidSection {
            permissions: doc.get_list(APP, "android.permissions"),
            api: number(doc, APP, "android.api"),
            minapi: number(doc, APP, "android.minapi"),
            ndk: string(doc, APP, "android.ndk"),
            archs: archs
                .iter()
                .filter_map(|a| a.parse().ok())
                .collect(),
            build_tools: string(doc, APP, "android.build_tools"),
            allow_backup: boolean(doc, APP, "android.allow_backup"),
            presplash_color: string(doc, APP, "android.presplash_color"),
            skip_download: boolean(doc, APP, "android.skip_download"),
            accept_sdk_license: boolean(doc, APP, "android.accept_sdk_license"),
            sdk_dir: string(doc, APP, "android.sdk_dir"),
            sdk_manager: string(doc, APP, "android.sdk_manager"),
        };

        Self {
            app: AppSection {
                title: string(doc, APP, "title"),
                package_name: string(doc, APP, "package.name"),
                package_domain: string(doc, APP, "package.domain"),
                version: string(doc, APP, "version"),
                source_dir: string(doc, APP, "source.dir"),
                source_main: string(doc, APP, "source.main"),
                requirements: doc.get_list(APP, "requirements"),
                orientation: string(doc, APP, "orientation"),
                android,
            },
            buildozer: BuildozerSection {
                log_level: number(doc, BUILDOZER, "log_level"),
                warn_on_root: boolean(doc, BUILDOZER, "warn_on_root"),
                cache_dir: string(doc, BUILDOZER, "buildozer.cache_dir"),
                parallel_build: boolean(doc, BUILDOZER, "buildozer.parallel_build"),
            },
        }
    }

    /// Full Android package id, `{package.domain}.{package.name}`.
    pub fn package_id(&self) -> Option<String> {
        let domain = self.app.package_domain.as_deref()?;
        let name = self.app.package_name.as_deref()?;
        Some(format!("{domain}.{name}"))
    }
}

impl From<&Document> for BuildozerSpec {
    fn from(doc: &Document) -> Self {
        Self::from_document(doc)
    }
}

//! Build result inspection: APK discovery and build log analysis.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use byte_unit::{Byte, Unit};

use crate::utils::walk_files;

/// How many lines each log category keeps.
pub const LOG_MATCH_LIMIT: usize = 10;

/// An APK found after a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkFile {
    pub path: PathBuf,
    /// Search directory it was found under.
    pub found_in: PathBuf,
    pub size: u64,
}

impl ApkFile {
    /// Size in MiB with one decimal, e.g. `12.3 MiB`.
    pub fn size_display(&self) -> String {
        format_size(self.size)
    }
}

pub fn format_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_adjusted_unit(Unit::MiB);
    format!("{adjusted:.1}")
}

/// Searches `dirs` recursively for `*.apk` files.
///
/// Missing directories are skipped. A file reachable from several search
/// directories is reported once, under the first directory that found it.
pub fn find_apks(dirs: &[PathBuf]) -> io::Result<Vec<ApkFile>> {
    let mut seen = HashSet::new();
    let mut apks = Vec::new();

    for dir in dirs {
        for path in walk_files(dir)? {
            let is_apk = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("apk"));
            if !is_apk {
                continue;
            }
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                continue;
            }
            let size = fs::metadata(&path)?.len();
            apks.push(ApkFile {
                path,
                found_in: dir.clone(),
                size,
            });
        }
    }
    Ok(apks)
}

/// Copies `apk` into `bin_dir` unless it already lives there.
///
/// Returns the destination when a copy was made.
pub fn collect_into(apk: &ApkFile, bin_dir: &Path) -> io::Result<Option<PathBuf>> {
    let Some(name) = apk.path.file_name() else {
        return Ok(None);
    };
    let canonical_bin = fs::canonicalize(bin_dir).unwrap_or_else(|_| bin_dir.to_path_buf());
    let canonical_apk = fs::canonicalize(&apk.path).unwrap_or_else(|_| apk.path.clone());
    if canonical_apk.starts_with(&canonical_bin) {
        return Ok(None);
    }

    fs::create_dir_all(bin_dir)?;
    let dest = bin_dir.join(name);
    fs::copy(&apk.path, &dest)?;
    Ok(Some(dest))
}

/// Lines of interest pulled out of a failed build's log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogAnalysis {
    /// First lines mentioning `aidl`.
    pub aidl: Vec<String>,
    /// First lines mentioning `license`.
    pub license: Vec<String>,
    /// Last lines mentioning `error` or `failed`.
    pub errors: Vec<String>,
}

impl LogAnalysis {
    /// Scans `content` case-insensitively, keeping at most
    /// [`LOG_MATCH_LIMIT`] lines per category.
    pub fn from_log(content: &str) -> Self {
        let mut analysis = Self::default();
        let mut errors = Vec::new();

        for line in content.lines() {
            let lower = line.to_lowercase();
            if lower.contains("aidl") && analysis.aidl.len() < LOG_MATCH_LIMIT {
                analysis.aidl.push(line.to_string());
            }
            if lower.contains("license") && analysis.license.len() < LOG_MATCH_LIMIT {
                analysis.license.push(line.to_string());
            }
            if lower.contains("error") || lower.contains("failed") {
                errors.push(line);
            }
        }

        let skip = errors.len().saturating_sub(LOG_MATCH_LIMIT);
        analysis.errors = errors[skip..].iter().map(|s| s.to_string()).collect();
        analysis
    }

    /// Reads and scans the log at `path`; invalid UTF-8 is replaced.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_log(&String::from_utf8_lossy(&bytes)))
    }

    pub fn is_empty(&self) -> bool {
        self.aidl.is_empty() && self.license.is_empty() && self.errors.is_empty()
    }
}

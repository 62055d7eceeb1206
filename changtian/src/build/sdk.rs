//! Android SDK probing.
//!
//! Buildozer expects a usable SDK with at least one build-tools component,
//! and the packaging step fails late and obscurely when `aidl` is missing
//! from it. The checks here surface those problems before a build starts.

use std::{
    cmp::Ordering,
    fs, io,
    path::{Path, PathBuf},
};

use crate::utils::walk_files;

/// Name of the AIDL compiler binary inside build-tools.
pub const AIDL: &str = "aidl";

/// An Android SDK root directory.
#[derive(Clone, Debug)]
pub struct AndroidSdk {
    android_home: PathBuf,
}

/// One installed build-tools component, e.g. `build-tools/33.0.2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTools {
    pub version: String,
    pub path: PathBuf,
}

impl BuildTools {
    /// Path where this component's `aidl` should be.
    pub fn aidl(&self) -> PathBuf {
        self.path.join(AIDL)
    }
}

// Orders strings so that embedded numbers compare by value: `9.0.0` sorts
// before `10.0.0`, and `33.0.2` before `33.0.10`.
pub fn cmp_natural(mut lhs: &str, mut rhs: &str) -> Ordering {
    fn advance<'a>(stream: &mut &'a str) -> (&'a str, &'a str) {
        let rem = *stream;
        let (name, rem) =
            rem.split_at(rem.find(|c: char| c.is_ascii_digit()).unwrap_or(rem.len()));
        let (number, rem) =
            rem.split_at(rem.find(|c: char| !c.is_ascii_digit()).unwrap_or(rem.len()));
        *stream = rem;
        (name, number)
    }

    while !lhs.is_empty() || !rhs.is_empty() {
        let (l_name, l_num) = advance(&mut lhs);
        let (r_name, r_num) = advance(&mut rhs);

        let ord = l_name.cmp(r_name).then_with(|| {
            match (l_num.parse::<u64>(), r_num.parse::<u64>()) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                _ => Ordering::Equal,
            }
            .then_with(|| l_num.cmp(r_num))
        });
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl AndroidSdk {
    /// Wraps an SDK root.
    ///
    /// # Errors
    ///
    /// Returns an error if `android_home` is not a directory.
    pub fn new(android_home: &Path) -> anyhow::Result<Self> {
        if !android_home.is_dir() {
            bail!(
                "Android SDK directory does not exist: {}",
                android_home.display()
            );
        }
        Ok(Self {
            android_home: android_home.to_path_buf(),
        })
    }

    pub fn android_home(&self) -> &Path {
        &self.android_home
    }

    /// Installed build-tools, oldest version first.
    ///
    /// A missing `build-tools` directory yields an empty list.
    pub fn build_tools(&self) -> io::Result<Vec<BuildTools>> {
        let dir = self.android_home.join("build-tools");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            // 非 Unicode 目录名无法比较版本，直接忽略
            let Ok(version) = entry.file_name().into_string() else {
                continue;
            };
            tools.push(BuildTools {
                version,
                path: entry.path(),
            });
        }
        tools.sort_by(|a, b| cmp_natural(&a.version, &b.version));
        Ok(tools)
    }

    /// The newest installed build-tools.
    pub fn latest_build_tools(&self) -> io::Result<Option<BuildTools>> {
        Ok(self.build_tools()?.pop())
    }

    /// First `aidl` found in `tools`, searching the newest version first.
    pub fn find_aidl(tools: &[BuildTools]) -> Option<PathBuf> {
        tools.iter().rev().map(BuildTools::aidl).find(|p| p.is_file())
    }

    /// Every file named `aidl` anywhere below the SDK root.
    pub fn search_aidl(&self) -> io::Result<Vec<PathBuf>> {
        Ok(walk_files(&self.android_home)?
            .into_iter()
            .filter(|p| p.file_name().is_some_and(|n| n == AIDL))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sdk(versions: &[&str]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for v in versions {
            fs::create_dir_all(tmp.path().join("build-tools").join(v)).unwrap();
        }
        tmp
    }

    #[test]
    fn test_cmp_natural() {
        assert_eq!(cmp_natural("33.0.2", "33.0.2"), Ordering::Equal);
        assert_eq!(cmp_natural("9.0.0", "10.0.0"), Ordering::Less);
        assert_eq!(cmp_natural("33.0.10", "33.0.2"), Ordering::Greater);
        assert_eq!(cmp_natural("34.0.0-rc1", "34.0.0"), Ordering::Greater);
        assert_eq!(cmp_natural("foo2bar3", "foo10bar10"), Ordering::Less);
    }

    #[test]
    fn test_missing_sdk() {
        let err = AndroidSdk::new(Path::new("/<invalid>/sdk")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_build_tools_sorted_naturally() {
        let tmp = fake_sdk(&["33.0.2", "9.0.0", "30.0.3"]);
        fs::write(tmp.path().join("build-tools/README"), "").unwrap();
        let sdk = AndroidSdk::new(tmp.path()).unwrap();

        let versions: Vec<_> = sdk
            .build_tools()
            .unwrap()
            .into_iter()
            .map(|t| t.version)
            .collect();
        assert_eq!(versions, vec!["9.0.0", "30.0.3", "33.0.2"]);
        assert_eq!(sdk.latest_build_tools().unwrap().unwrap().version, "33.0.2");
    }

    #[test]
    fn test_no_build_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let sdk = AndroidSdk::new(tmp.path()).unwrap();
        assert!(sdk.build_tools().unwrap().is_empty());
        assert!(sdk.latest_build_tools().unwrap().is_none());
    }

    #[test]
    fn test_find_aidl_prefers_newest() {
        let tmp = fake_sdk(&["30.0.3", "33.0.2", "34.0.0"]);
        fs::write(tmp.path().join("build-tools/30.0.3/aidl"), "").unwrap();
        fs::write(tmp.path().join("build-tools/33.0.2/aidl"), "").unwrap();
        let sdk = AndroidSdk::new(tmp.path()).unwrap();

        let tools = sdk.build_tools().unwrap();
        assert_eq!(
            AndroidSdk::find_aidl(&tools),
            Some(tmp.path().join("build-tools/33.0.2/aidl"))
        );
    }

    #[test]
    fn test_search_aidl_outside_build_tools() {
        let tmp = fake_sdk(&["33.0.2"]);
        fs::create_dir_all(tmp.path().join("platform-tools/bin")).unwrap();
        fs::write(tmp.path().join("platform-tools/bin/aidl"), "").unwrap();
        let sdk = AndroidSdk::new(tmp.path()).unwrap();

        assert_eq!(AndroidSdk::find_aidl(&sdk.build_tools().unwrap()), None);
        assert_eq!(
            sdk.search_aidl().unwrap(),
            vec![tmp.path().join("platform-tools/bin/aidl")]
        );
    }
}

//! Lossless INI document model.
//!
//! Every physical line of the file is kept, so a document that is parsed
//! and rendered again without edits reproduces its input. Edits through
//! [`Document::set`] and [`Document::remove`] only touch the affected lines.
//!
//! # Syntax
//!
//! ```text
//! [app]
//! # comment
//! title = My Application
//! requirements = python3,kivy
//! android.permissions = INTERNET,
//!     WRITE_EXTERNAL_STORAGE
//! ```
//!
//! - `#` and `;` start full-line comments; inline comments are not
//!   recognised, so `android.presplash_color = #FFFFFF` keeps its value.
//! - `=` or `:` separates key and value, whichever comes first.
//! - An indented line directly after an entry continues its value.

use std::{collections::HashSet, fmt, fs, path::Path};

use crate::{
    error::{Result, SpecError},
    parse_bool, split_list,
};

const CONTINUATION_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Blank(String),
    Comment(String),
    Section {
        name: String,
        raw: String,
    },
    Entry {
        section: String,
        key: String,
        value: String,
        // None once the entry has been edited
        raw: Option<String>,
    },
    Continuation(String),
}

/// A parsed spec file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    trailing_newline: bool,
}

/// Borrowed view of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub section: &'a str,
    pub key: &'a str,
    pub value: &'a str,
    /// 1-based line number of the `key = value` line.
    pub line: usize,
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}

fn split_entry(trimmed: &str) -> Option<(&str, &str)> {
    let at = trimmed.find(['=', ':'])?;
    let key = trimmed[..at].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, trimmed[at + 1..].trim()))
}

impl Document {
    /// Parses spec file text.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the 1-based line number for entries outside
    /// a section, duplicate sections, duplicate keys, and lines that cannot
    /// be understood.
    pub fn parse(text: &str) -> Result<Self> {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);

        let mut lines = Vec::new();
        let mut section: Option<String> = None;
        let mut seen_sections = HashSet::new();
        let mut seen_keys: HashSet<(String, String)> = HashSet::new();

        if !text.is_empty() {
            for (idx, raw) in body.split('\n').enumerate() {
                let line_no = idx + 1;
                let trimmed = raw.trim();

                if trimmed.is_empty() {
                    lines.push(Line::Blank(raw.to_string()));
                    continue;
                }
                if is_comment(trimmed) {
                    lines.push(Line::Comment(raw.to_string()));
                    continue;
                }

                let indented = raw.starts_with([' ', '\t']);
                let follows_entry = matches!(
                    lines.last(),
                    Some(Line::Entry { .. }) | Some(Line::Continuation(_))
                );
                if indented && follows_entry {
                    if let Some(value) = lines.iter_mut().rev().find_map(|l| match l {
                        Line::Entry { value, .. } => Some(value),
                        _ => None,
                    }) {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(trimmed);
                    }
                    lines.push(Line::Continuation(raw.to_string()));
                    continue;
                }

                if let Some(name) = trimmed
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                {
                    let name = name.trim().to_string();
                    if !seen_sections.insert(name.clone()) {
                        return Err(SpecError::DuplicateSection {
                            line: line_no,
                            name,
                        });
                    }
                    section = Some(name.clone());
                    lines.push(Line::Section {
                        name,
                        raw: raw.to_string(),
                    });
                    continue;
                }

                let Some((key, value)) = split_entry(trimmed) else {
                    return Err(SpecError::Syntax {
                        line: line_no,
                        text: trimmed.to_string(),
                    });
                };
                let Some(current) = section.clone() else {
                    return Err(SpecError::MissingSection { line: line_no });
                };
                if !seen_keys.insert((current.clone(), key.to_string())) {
                    return Err(SpecError::DuplicateKey {
                        line: line_no,
                        section: current,
                        key: key.to_string(),
                    });
                }
                lines.push(Line::Entry {
                    section: current,
                    key: key.to_string(),
                    value: value.to_string(),
                    raw: Some(raw.to_string()),
                });
            }
        }

        Ok(Self {
            lines,
            trailing_newline,
        })
    }

    /// Reads and parses a spec file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Writes the rendered document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_string()).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Section names in file order.
    pub fn sections(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                Line::Section { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if the `[section]` header is present.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections().contains(&section)
    }

    /// All entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = EntryRef<'_>> {
        self.lines.iter().enumerate().filter_map(|(idx, l)| match l {
            Line::Entry {
                section,
                key,
                value,
                ..
            } => Some(EntryRef {
                section,
                key,
                value,
                line: idx + 1,
            }),
            _ => None,
        })
    }

    /// Entries of one section in file order.
    pub fn entries<'a>(&'a self, section: &'a str) -> impl Iterator<Item = EntryRef<'a>> + 'a {
        self.iter().filter(move |e| e.section == section)
    }

    /// Looks up one entry.
    pub fn entry(&self, section: &str, key: &str) -> Option<EntryRef<'_>> {
        self.iter().find(|e| e.section == section && e.key == key)
    }

    /// Returns the value of `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entry(section, key).map(|e| e.value)
    }

    /// Returns the value of `key`, or `None` if absent or blank.
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|v| !v.trim().is_empty())
    }

    /// Returns a comma-separated value as a list. Absent keys yield an
    /// empty list.
    pub fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get(section, key).map(split_list).unwrap_or_default()
    }

    /// Returns a boolean value.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidBool`] if the key is present but does not
    /// hold a boolean.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(section, key) else {
            return Ok(None);
        };
        parse_bool(value)
            .map(Some)
            .ok_or_else(|| SpecError::InvalidBool {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    /// 1-based line of `key` in `section`.
    pub fn line_of(&self, section: &str, key: &str) -> Option<usize> {
        self.entry(section, key).map(|e| e.line)
    }

    fn entry_index(&self, section: &str, key: &str) -> Option<usize> {
        self.lines.iter().position(|l| {
            matches!(l, Line::Entry { section: s, key: k, .. } if s == section && k == key)
        })
    }

    fn continuation_len(&self, entry_idx: usize) -> usize {
        self.lines[entry_idx + 1..]
            .iter()
            .take_while(|l| matches!(l, Line::Continuation(_)))
            .count()
    }

    // Rejects names, keys and values that `parse` would not read back as
    // the same entry.
    fn check_entry(section: &str, key: &str, value: &str) -> Result<()> {
        let bad_section = section.is_empty()
            || section != section.trim()
            || section.contains([']', '\n', '\r']);
        if bad_section {
            return Err(SpecError::InvalidSection {
                name: section.to_string(),
            });
        }

        let bad_key = key.is_empty()
            || key != key.trim()
            || key.contains(['=', ':', '\n', '\r'])
            || key.starts_with(['#', ';', '[']);
        if bad_key {
            return Err(SpecError::InvalidKey {
                section: section.to_string(),
                key: key.to_string(),
            });
        }

        let continuation = value
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .skip(1)
            .find(|p| is_comment(p));
        if let Some(text) = continuation {
            return Err(SpecError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                text: text.to_string(),
            });
        }
        Ok(())
    }

    fn entry_lines(section: &str, key: &str, value: &str) -> Vec<Line> {
        let parts: Vec<&str> = value
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let mut out = vec![Line::Entry {
            section: section.to_string(),
            key: key.to_string(),
            value: parts.join("\n"),
            raw: None,
        }];
        out.extend(
            parts
                .iter()
                .skip(1)
                .map(|p| Line::Continuation(format!("{CONTINUATION_INDENT}{p}"))),
        );
        out
    }

    /// Sets `key` in `section` to `value`.
    ///
    /// An existing entry is rewritten in place. A new key is appended after
    /// the last entry of its section, and a missing section is appended at
    /// the end of the document. Multi-line values are written as indented
    /// continuation lines.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidSection`], [`SpecError::InvalidKey`] or
    /// [`SpecError::InvalidValue`] if the entry could not be written so that
    /// it reads back unchanged; the document is left untouched then.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        Self::check_entry(section, key, value)?;
        let new_lines = Self::entry_lines(section, key, value);

        if let Some(idx) = self.entry_index(section, key) {
            let old = 1 + self.continuation_len(idx);
            self.lines.splice(idx..idx + old, new_lines);
            return Ok(());
        }

        let header = self
            .lines
            .iter()
            .position(|l| matches!(l, Line::Section { name, .. } if name == section));

        match header {
            Some(header) => {
                let mut insert_at = header + 1;
                for (idx, line) in self.lines.iter().enumerate().skip(header + 1) {
                    match line {
                        Line::Section { .. } => break,
                        Line::Entry { .. } | Line::Continuation(_) => insert_at = idx + 1,
                        _ => {}
                    }
                }
                self.lines.splice(insert_at..insert_at, new_lines);
            }
            None => {
                if !matches!(self.lines.last(), None | Some(Line::Blank(_))) {
                    self.lines.push(Line::Blank(String::new()));
                }
                self.lines.push(Line::Section {
                    name: section.to_string(),
                    raw: format!("[{section}]"),
                });
                self.lines.extend(new_lines);
                self.trailing_newline = true;
            }
        }
        Ok(())
    }

    /// Removes `key` from `section`. Returns `true` if it was present.
    pub fn remove(&mut self, section: &str, key: &str) -> bool {
        let Some(idx) = self.entry_index(section, key) else {
            return false;
        };
        let len = 1 + self.continuation_len(idx);
        self.lines.drain(idx..idx + len);
        true
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            match line {
                Line::Blank(raw)
                | Line::Comment(raw)
                | Line::Continuation(raw)
                | Line::Section { raw, .. } => f.write_str(raw)?,
                Line::Entry { raw: Some(raw), .. } => f.write_str(raw)?,
                Line::Entry {
                    key,
                    value,
                    raw: None,
                    ..
                } => {
                    let first = value.split('\n').next().unwrap_or_default();
                    write!(f, "{key} = {first}")?;
                }
            }
        }
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Document {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[app]

# (str) Title of your application
title = 长天快速世界书
package.name = changtianworldbook
package.domain = org.changtian
android.presplash_color = #FFFFFF
android.permissions = INTERNET,
    WRITE_EXTERNAL_STORAGE
;    android.ndk = 23b

[buildozer]
log_level = 2
";

    #[test]
    fn test_round_trip_is_lossless() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_string(), SAMPLE);

        let crlf = "[app]\r\ntitle = X\r\n";
        assert_eq!(Document::parse(crlf).unwrap().to_string(), crlf);
    }

    #[test]
    fn test_lookup() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.sections(), vec!["app", "buildozer"]);
        assert_eq!(doc.get("app", "title"), Some("长天快速世界书"));
        assert_eq!(doc.get("app", "android.presplash_color"), Some("#FFFFFF"));
        assert_eq!(doc.get("app", "android.ndk"), None);
        assert_eq!(doc.get("buildozer", "title"), None);
        assert_eq!(doc.line_of("app", "title"), Some(4));
        assert_eq!(doc.line_of("buildozer", "log_level"), Some(13));
    }

    #[test]
    fn test_continuation_lines() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(
            doc.get("app", "android.permissions"),
            Some("INTERNET,\nWRITE_EXTERNAL_STORAGE")
        );
        assert_eq!(
            doc.get_list("app", "android.permissions"),
            vec!["INTERNET", "WRITE_EXTERNAL_STORAGE"]
        );
    }

    #[test]
    fn test_colon_delimiter() {
        let doc = Document::parse("[app]\nsource.dir: .\nurl = https://x.org/a\n").unwrap();
        assert_eq!(doc.get("app", "source.dir"), Some("."));
        assert_eq!(doc.get("app", "url"), Some("https://x.org/a"));
    }

    #[test]
    fn test_get_bool() {
        let doc = Document::parse("[app]\na = True\nb = 0\nc = sure\n").unwrap();
        assert_eq!(doc.get_bool("app", "a").unwrap(), Some(true));
        assert_eq!(doc.get_bool("app", "b").unwrap(), Some(false));
        assert_eq!(doc.get_bool("app", "missing").unwrap(), None);
        assert!(matches!(
            doc.get_bool("app", "c"),
            Err(SpecError::InvalidBool { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        let err = Document::parse("title = x\n").unwrap_err();
        assert!(matches!(err, SpecError::MissingSection { line: 1 }));

        let err = Document::parse("[app]\n[app]\n").unwrap_err();
        assert!(matches!(err, SpecError::DuplicateSection { line: 2, .. }));

        let err = Document::parse("[app]\na = 1\n\na = 2\n").unwrap_err();
        assert_eq!(err.line(), Some(4));

        let err = Document::parse("[app]\njust some words\n").unwrap_err();
        assert!(matches!(err, SpecError::Syntax { line: 2, .. }));

        // 同名键在不同节中允许
        assert!(Document::parse("[a]\nk = 1\n[b]\nk = 2\n").is_ok());
    }

    #[test]
    fn test_set_existing_keeps_surroundings() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        doc.set("buildozer", "log_level", "1").unwrap();
        let out = doc.to_string();
        assert!(out.contains("log_level = 1\n"));
        assert!(out.contains("# (str) Title of your application\n"));
        assert_eq!(doc.get("buildozer", "log_level"), Some("1"));
    }

    #[test]
    fn test_set_replaces_continuations() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        doc.set("app", "android.permissions", "INTERNET").unwrap();
        let out = doc.to_string();
        assert!(out.contains("android.permissions = INTERNET\n;"));
        assert!(!out.contains("WRITE_EXTERNAL_STORAGE"));
    }

    #[test]
    fn test_set_new_key_goes_after_last_entry() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        doc.set("app", "android.api", "33").unwrap();
        let out = doc.to_string();
        assert!(out.contains("    WRITE_EXTERNAL_STORAGE\nandroid.api = 33\n;"));
        assert_eq!(doc.line_of("app", "android.api"), Some(10));
        assert_eq!(doc.line_of("buildozer", "log_level"), Some(14));
    }

    #[test]
    fn test_set_new_section() {
        let mut doc = Document::parse("[app]\ntitle = X").unwrap();
        doc.set("buildozer", "warn_on_root", "1").unwrap();
        assert_eq!(doc.to_string(), "[app]\ntitle = X\n\n[buildozer]\nwarn_on_root = 1\n");
    }

    #[test]
    fn test_set_multiline_value() {
        let mut doc = Document::parse("[app]\n").unwrap();
        doc.set("app", "requirements", "python3,\nkivy").unwrap();
        assert_eq!(doc.to_string(), "[app]\nrequirements = python3,\n    kivy\n");
        let back = Document::parse(&doc.to_string()).unwrap();
        assert_eq!(back.get_list("app", "requirements"), vec!["python3", "kivy"]);
    }

    #[test]
    fn test_set_rejects_entries_that_do_not_read_back() {
        let original = "[app]\ntitle = X\n";
        let mut doc = Document::parse(original).unwrap();

        for key in ["a:b", "a=b", "#title", ";title", "[title", "", " title", "a\nb"] {
            assert!(
                matches!(doc.set("app", key, "v"), Err(SpecError::InvalidKey { .. })),
                "{key:?}"
            );
        }
        for section in ["a]b", "a\nb", "", " app"] {
            assert!(
                matches!(doc.set(section, "k", "v"), Err(SpecError::InvalidSection { .. })),
                "{section:?}"
            );
        }
        let err = doc.set("app", "requirements", "python3,\n#kivy").unwrap_err();
        assert!(matches!(err, SpecError::InvalidValue { ref text, .. } if text == "#kivy"));
        assert!(doc.set("app", "requirements", "python3,\n  ;kivy").is_err());

        assert_eq!(doc.to_string(), original);
    }

    #[test]
    fn test_set_values_read_back() {
        let mut doc = Document::parse("[app]\ntitle = X\n").unwrap();
        doc.set("app", "android.presplash_color", "#FFFFFF").unwrap();
        doc.set("app", "url", "https://x.org/a=b").unwrap();
        doc.set("app", "requirements", "python3,\n[kivy]").unwrap();

        let back = Document::parse(&doc.to_string()).unwrap();
        assert_eq!(back.get("app", "android.presplash_color"), Some("#FFFFFF"));
        assert_eq!(back.get("app", "url"), Some("https://x.org/a=b"));
        assert_eq!(back.get("app", "requirements"), Some("python3,\n[kivy]"));
    }

    #[test]
    fn test_remove() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        assert!(doc.remove("app", "android.permissions"));
        assert!(!doc.remove("app", "android.permissions"));
        assert!(!doc.to_string().contains("WRITE_EXTERNAL_STORAGE"));
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::parse("").unwrap();
        assert!(doc.sections().is_empty());
        assert_eq!(doc.to_string(), "");
    }
}

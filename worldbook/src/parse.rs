//! Pseudo-XML scanner.
//!
//! The notation is not real XML: there is no escaping, no attributes and no
//! requirement that tags nest. Entries are delimited by `<startl>` and
//! `<endl>`; inside an entry every `<name>...</name>` pair becomes a field.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::entry::Entry;

const ENTRY_START: &str = "<startl>";
const ENTRY_END: &str = "<endl>";

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+)>").expect("static regex is valid"));

/// Parses every complete entry in `content`.
///
/// Entries without a closing `<endl>` are ignored, as is any text outside
/// of entries. Ids are assigned from 1 in order of appearance.
pub fn parse(content: &str) -> Vec<Entry> {
    entry_bodies(content)
        .enumerate()
        .map(|(i, body)| Entry::from_fields(i + 1, &fields(body)))
        .collect()
}

/// Iterates over the text between each `<startl>` and the nearest
/// following `<endl>`.
pub fn entry_bodies(content: &str) -> impl Iterator<Item = &str> {
    let mut rest = content;
    std::iter::from_fn(move || {
        let start = rest.find(ENTRY_START)? + ENTRY_START.len();
        let len = rest[start..].find(ENTRY_END)?;
        let body = &rest[start..start + len];
        rest = &rest[start + len + ENTRY_END.len()..];
        Some(body)
    })
}

/// Collects the `<name>value</name>` pairs of one entry body.
///
/// The value runs to the nearest matching close tag. An open tag that is
/// never closed is skipped. When a name repeats, the later value wins.
pub fn fields(body: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let mut pos = 0;

    while let Some(caps) = OPEN_TAG.captures(&body[pos..]) {
        let Some(open) = caps.get(0) else {
            break;
        };
        let name = &caps[1];
        let value_start = pos + open.end();

        let close = format!("</{name}>");
        match body[value_start..].find(&close) {
            Some(len) => {
                let value = &body[value_start..value_start + len];
                out.insert(name.to_string(), value.to_string());
                pos = value_start + len + close.len();
            }
            // 不完整的标签，跳过继续扫描
            None => pos = value_start,
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_entries() {
        let src = "header <startl><comment>A</comment><endl> noise \
                   <startl><comment>B</comment><constant>常驻</constant><endl> trailer";
        let entries = parse(src);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[0].metadata.name, "A");
        assert_eq!(entries[1].id, 2);
        assert_eq!(entries[1].metadata.name, "B");
        assert_eq!(entries[1].metadata.kind, "常驻");
    }

    #[test]
    fn test_unterminated_entry_is_ignored() {
        let entries = parse("<startl><comment>A</comment><endl><startl><comment>B</comment>");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.name, "A");
    }

    #[test]
    fn test_nearest_endl_wins() {
        let bodies: Vec<_> = entry_bodies("<startl>a<startl>b<endl>c<endl>").collect();
        assert_eq!(bodies, vec!["a<startl>b"]);
    }

    #[test]
    fn test_values_span_lines_and_keep_whitespace() {
        let f = fields("<content>\n  line one\nline two </content>");
        assert_eq!(f["content"], "\n  line one\nline two ");
    }

    #[test]
    fn test_unclosed_tag_is_skipped() {
        let f = fields("<position>Char↑<comment>名字</comment>");
        assert_eq!(f.len(), 1);
        assert_eq!(f["comment"], "名字");
    }

    #[test]
    fn test_nested_markup_stays_in_value() {
        let f = fields("<content><b>bold</b> text</content>");
        assert_eq!(f["content"], "<b>bold</b> text");
        assert!(!f.contains_key("b"));
    }

    #[test]
    fn test_repeated_field_last_wins() {
        let f = fields("<comment>first</comment><comment>second</comment>");
        assert_eq!(f["comment"], "second");
    }

    #[test]
    fn test_unicode_tag_names() {
        let f = fields("<备注>说明</备注>");
        assert_eq!(f["备注"], "说明");
    }

    #[test]
    fn test_empty_field_value() {
        let entries = parse("<startl><keyPositif></keyPositif><endl>");
        assert_eq!(entries[0].content.keywords, "");
        assert_eq!(entries[0].metadata.name, "未命名");
    }
}

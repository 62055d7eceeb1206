//! Tavo document generation.
//!
//! # Output Format
//!
//! ```json
//! {
//!   "tavo_format": {
//!     "version": "1.0",
//!     "generator": "长天快速世界书",
//!     "timestamp": "2024-05-01T12:30:00.123456",
//!     "statistics": {
//!       "total_entries": 1,
//!       "entry_types": { "常驻": 1 }
//!     },
//!     "entries": [ ... ]
//!   }
//! }
//! ```

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{GENERATOR, TAVO_VERSION, entry::Entry, error::Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// Microseconds are appended only when non-zero.
fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    let mut out = timestamp.format(TIMESTAMP_FORMAT).to_string();
    let micros = timestamp.nanosecond() / 1_000 % 1_000_000;
    if micros != 0 {
        out += &format!(".{micros:06}");
    }
    out
}

/// Root of a Tavo JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavoDocument {
    pub tavo_format: TavoFormat,
}

/// Body of a Tavo JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavoFormat {
    pub version: String,
    pub generator: String,
    /// Local time of generation, without offset.
    pub timestamp: String,
    pub statistics: Statistics,
    pub entries: Vec<Entry>,
}

/// Summary counters over the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_entries: usize,
    pub entry_types: TypeTally,
}

/// Per-type entry counts in order of first appearance.
///
/// Serialized as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTally(Vec<(String, usize)>);

impl TypeTally {
    /// Counts entries by `metadata.type`.
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut tally = Self::default();
        for entry in entries {
            tally.add(&entry.metadata.kind);
        }
        tally
    }

    /// Increments the counter for `kind`.
    pub fn add(&mut self, kind: &str) {
        match self.0.iter_mut().find(|(k, _)| k == kind) {
            Some((_, n)) => *n += 1,
            None => self.0.push((kind.to_string(), 1)),
        }
    }

    /// Returns the count for `kind`, zero if unseen.
    pub fn get(&self, kind: &str) -> usize {
        self.0
            .iter()
            .find(|(k, _)| k == kind)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, n)| (k.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TypeTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, n) in &self.0 {
            map.serialize_entry(k, n)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeTally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TallyVisitor;

        impl<'v> Visitor<'v> for TallyVisitor {
            type Value = TypeTally;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of entry type to count")
            }

            fn visit_map<A: MapAccess<'v>>(
                self,
                mut access: A,
            ) -> std::result::Result<TypeTally, A::Error> {
                let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, n)) = access.next_entry::<String, usize>()? {
                    out.push((k, n));
                }
                Ok(TypeTally(out))
            }
        }

        deserializer.deserialize_map(TallyVisitor)
    }
}

impl TavoDocument {
    /// Builds a document with the given generation time.
    pub fn new(entries: Vec<Entry>, timestamp: NaiveDateTime) -> Self {
        Self {
            tavo_format: TavoFormat {
                version: TAVO_VERSION.to_string(),
                generator: GENERATOR.to_string(),
                timestamp: format_timestamp(&timestamp),
                statistics: Statistics {
                    total_entries: entries.len(),
                    entry_types: TypeTally::from_entries(&entries),
                },
                entries,
            },
        }
    }

    /// Builds a document stamped with the current local time.
    pub fn now(entries: Vec<Entry>) -> Self {
        Self::new(entries, Local::now().naive_local())
    }

    /// Renders the document with two-space indentation.
    ///
    /// Non-ASCII text is written verbatim, not escaped.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders the document on a single line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a previously generated document.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::parse;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 0, 42)
            .unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let doc = TavoDocument::new(Vec::new(), fixed_time());
        assert_eq!(doc.tavo_format.timestamp, "2024-05-01T12:30:00.000042");
    }

    #[test]
    fn test_timestamp_whole_second_has_no_fraction() {
        let time = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let doc = TavoDocument::new(Vec::new(), time);
        assert_eq!(doc.tavo_format.timestamp, "2024-05-01T12:30:00");

        let time = time.with_nanosecond(999).unwrap();
        let doc = TavoDocument::new(Vec::new(), time);
        assert_eq!(doc.tavo_format.timestamp, "2024-05-01T12:30:00");
    }

    #[test]
    fn test_entry_types_keep_first_seen_order() {
        let entries = parse(
            "<startl><constant>绿灯</constant><endl>\
             <startl><constant>常驻</constant><endl>\
             <startl><constant>绿灯</constant><endl>\
             <startl><endl>",
        );
        let doc = TavoDocument::new(entries, fixed_time());
        let stats = &doc.tavo_format.statistics;
        assert_eq!(stats.total_entries, 4);
        let types: Vec<_> = stats.entry_types.iter().collect();
        assert_eq!(types, vec![("绿灯", 2), ("常驻", 1), ("未知", 1)]);

        let json = doc.to_json().unwrap();
        let green = json.find("\"绿灯\":2").unwrap();
        let constant = json.find("\"常驻\":1").unwrap();
        assert!(green < constant);
    }

    #[test]
    fn test_pretty_output_layout() {
        let doc = TavoDocument::new(parse(crate::EXAMPLE), fixed_time());
        let json = doc.to_json_pretty().unwrap();

        assert!(json.starts_with("{\n  \"tavo_format\": {\n    \"version\": \"1.0\",\n"));
        assert!(json.contains("\"generator\": \"长天快速世界书\""));
        assert!(json.contains("\"position\": \"Char↑\""));
        assert!(!json.contains("\\u"));

        let version = json.find("\"version\"").unwrap();
        let statistics = json.find("\"statistics\"").unwrap();
        let entries = json.find("\"entries\"").unwrap();
        assert!(version < statistics && statistics < entries);
    }

    #[test]
    fn test_reads_back_generated_document() {
        let doc = TavoDocument::new(parse(crate::EXAMPLE), fixed_time());
        let back = TavoDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.tavo_format.statistics.entry_types.get("常驻"), 1);
    }
}

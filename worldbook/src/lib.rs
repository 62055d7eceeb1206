//! # worldbook
//!
//! Converts "pseudo-XML" world book entries into the Tavo JSON format.
//!
//! A world book is a list of lore entries. Each entry is written between
//! `<startl>` and `<endl>` markers and carries its fields as
//! `<name>value</name>` pairs:
//!
//! ```text
//! <startl><comment>认知权限总纲</comment><position>Char↑</position>
//! <constant>常驻</constant><content>Cognition Matrix</content><endl>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use worldbook::convert;
//!
//! let doc = convert(worldbook::EXAMPLE).unwrap();
//! assert_eq!(doc.tavo_format.statistics.total_entries, 1);
//!
//! let json = doc.to_json_pretty().unwrap();
//! assert!(json.contains("\"generator\": \"长天快速世界书\""));
//! ```
//!
//! ## Modules
//!
//! - [`entry`] - Entry data structures
//! - [`parse`] - Pseudo-XML scanner
//! - [`tavo`] - Tavo document generation
//! - [`error`] - Error types and result definitions

/// Entry data structures.
pub mod entry;

/// Error types and result definitions for conversion.
pub mod error;

/// Pseudo-XML scanner.
pub mod parse;

/// Tavo document generation.
pub mod tavo;

pub use entry::{Content, Entry, Metadata};
pub use error::{Result, WorldBookError};
pub use parse::parse;
pub use tavo::{Statistics, TavoDocument, TavoFormat, TypeTally};

/// Name written into the `generator` field of every document.
pub const GENERATOR: &str = "长天快速世界书";

/// Tavo format version emitted by this crate.
pub const TAVO_VERSION: &str = "1.0";

/// A complete sample entry, useful as a starting template.
pub const EXAMPLE: &str = "<startl><comment>认知权限总纲</comment><position>Char↑</position><constant>常驻</constant><keyPositif></keyPositif><keyAdverse></keyAdverse><scanDep>0</scanDep><sticky>0</sticky><cooldown>0</cooldown><delay>0</delay><content>Cognition Matrix</content><CN_annotation>维度：总纲</CN_annotation><development>扩展方向</development><endl>";

/// Parses `content` and wraps the entries into a Tavo document stamped
/// with the current local time.
///
/// # Errors
///
/// Returns [`WorldBookError::EmptyInput`] if `content` is blank and
/// [`WorldBookError::NoEntries`] if no complete entry was found.
pub fn convert(content: &str) -> Result<TavoDocument> {
    let content = content.trim();
    if content.is_empty() {
        return Err(WorldBookError::EmptyInput);
    }

    let entries = parse(content);
    if entries.is_empty() {
        return Err(WorldBookError::NoEntries);
    }

    Ok(TavoDocument::now(entries))
}

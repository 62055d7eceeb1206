//! World book entry structures.
//!
//! The field layout mirrors the Tavo JSON output exactly; serde field order
//! is the output order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const UNNAMED: &str = "未命名";
const UNKNOWN: &str = "未知";

/// A single converted world book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based position of the entry in the source text.
    pub id: usize,
    /// Placement and activation settings.
    pub metadata: Metadata,
    /// Trigger keywords and body text.
    pub content: Content,
}

/// Placement and activation settings of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// From `<comment>`.
    pub name: String,
    /// From `<position>`, e.g. `Char↑`.
    pub position: String,
    /// From `<constant>`, e.g. `常驻`.
    #[serde(rename = "type")]
    pub kind: String,
    /// From `<scanDep>`.
    pub scan_depth: String,
    pub sticky: String,
    pub cooldown: String,
    pub delay: String,
}

/// Trigger keywords and body text of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// From `<keyPositif>`.
    pub keywords: String,
    /// From `<keyAdverse>`.
    pub negative_keywords: String,
    /// From `<content>`.
    pub main_content: String,
    /// From `<CN_annotation>`.
    pub annotation: String,
    pub development: String,
}

impl Entry {
    /// Builds an entry from raw tag/value pairs.
    ///
    /// Missing tags fall back to `未命名` for the name, `未知` for position
    /// and type, and an empty string for everything else.
    pub fn from_fields(id: usize, fields: &HashMap<String, String>) -> Self {
        let get = |tag: &str, default: &str| {
            fields
                .get(tag)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            id,
            metadata: Metadata {
                name: get("comment", UNNAMED),
                position: get("position", UNKNOWN),
                kind: get("constant", UNKNOWN),
                scan_depth: get("scanDep", ""),
                sticky: get("sticky", ""),
                cooldown: get("cooldown", ""),
                delay: get("delay", ""),
            },
            content: Content {
                keywords: get("keyPositif", ""),
                negative_keywords: get("keyAdverse", ""),
                main_content: get("content", ""),
                annotation: get("CN_annotation", ""),
                development: get("development", ""),
            },
        }
    }
}

//! Schema documents are published as markdown with one fenced `json` block.
//! The block is loosely written: single-quoted strings and trailing commas
//! are common, so both are cleaned up before parsing.

use crate::core::{MirrorError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

lazy_static! {
    static ref JSON_BLOCK: Regex = Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").unwrap();
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
}

/// Locate the fenced `json` block and return its raw text.
pub fn find_json_block(markdown: &str) -> Result<&str> {
    JSON_BLOCK
        .captures(markdown)
        .and_then(|captures| captures.get(1))
        .map(|block| block.as_str())
        .ok_or_else(|| MirrorError::Source("No JSON block found in the markdown".to_string()))
}

/// Rewrite single quotes to double quotes and drop trailing commas.
pub fn clean_json(block: &str) -> String {
    let quoted = block.replace('\'', "\"");
    TRAILING_COMMA.replace_all(&quoted, "$1").into_owned()
}

/// Extract, clean and parse the schema block of a markdown document.
pub fn extract_json_block(markdown: &str) -> Result<JsonValue> {
    let cleaned = clean_json(find_json_block(markdown)?);
    serde_json::from_str(&cleaned)
        .map_err(|e| MirrorError::Source(format!("Failed to decode JSON block: {}", e)))
}

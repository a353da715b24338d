//! Dataset file layout: `{data_dir}/{dataset}.json` for records and
//! `{schema_dir}/{dataset}_schema.json` for normalized schema blocks.

use crate::core::Result;
use serde_json::Value as JsonValue;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub fn data_path(data_dir: impl AsRef<Path>, dataset: &str) -> PathBuf {
    data_dir.as_ref().join(format!("{}.json", dataset))
}

pub fn schema_path(schema_dir: impl AsRef<Path>, dataset: &str) -> PathBuf {
    schema_dir.as_ref().join(format!("{}_schema.json", dataset))
}

pub fn read_json(path: impl AsRef<Path>) -> Result<JsonValue> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Pretty-print `value` to `path`, creating parent directories. The file is
/// replaced atomically so a crash never leaves a half-written dataset.
pub fn write_json(path: impl AsRef<Path>, value: &JsonValue) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    info!(path = %path.display(), "Saved");
    Ok(())
}

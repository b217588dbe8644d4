use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};

/// Writes `records` as a pretty-printed JSON array and returns how many were written.
///
/// The array goes to a temporary sibling first and is renamed over `path`, so readers see
/// either the previous file or the complete new one.
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(records)?;

    let tmp_path = path.with_extension("json.tmp");
    let replaced = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = replaced {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("Failed to write {:?}", path));
    }

    Ok(records.len())
}

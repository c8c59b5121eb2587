//! Atomic JSON persistence for the progress map.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use super::ProgressMap;

/// Read the progress map; a missing file yields an empty map.
pub(super) fn read_map(path: &Path) -> Result<ProgressMap> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ProgressMap::new()),
        Err(e) => return Err(e).with_context(|| format!("read progress: {}", path.display())),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProgressMap::new());
    }
    serde_json::from_slice(&bytes).with_context(|| format!("parse progress: {}", path.display()))
}

/// Write to a temp file in the same directory, fsync, then rename over `path`.
pub(super) fn write_map(path: &Path, map: &ProgressMap) -> Result<()> {
    write_bytes(path, &encode(map)?)
}

pub(super) fn encode(map: &ProgressMap) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(map).context("serialize progress")
}

/// Atomic replace of `path` with `json`. Blocks on the fsync.
pub(super) fn write_bytes(path: &Path, json: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(json).context("write progress temp file")?;
    tmp.as_file().sync_all().context("sync progress temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace progress: {}", path.display()))?;
    Ok(())
}

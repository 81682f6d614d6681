//! Persistence layer.
//!
//! The quote table lives in a single JSON file — the durable key-value
//! slot of the system. It is read once at startup and overwritten in
//! one write after every successful update batch. There is no
//! migration or versioning; malformed content is treated as absent.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::Quote;

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "setpulse_quotes.json";

/// Save the full quote table to the snapshot file (single write).
pub fn save_snapshot(quotes: &[Quote], path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(quotes)
        .context("Failed to serialise quote snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, quotes = quotes.len(), "Snapshot saved");
    Ok(())
}

/// Load the raw snapshot from disk.
///
/// Returns `None` when the file doesn't exist or doesn't parse —
/// a corrupt snapshot is recovered by falling back to seed defaults,
/// so parse failure is logged and swallowed rather than surfaced.
///
/// The raw JSON value (not typed quotes) is returned so the store can
/// overlay persisted fields onto seed defaults, preserving seed values
/// for fields a stale snapshot doesn't know about.
pub fn load_snapshot(path: Option<&str>) -> Result<Option<serde_json::Value>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting from seed");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    match serde_json::from_str::<serde_json::Value>(&json) {
        Ok(value) if value.is_array() => {
            info!(
                path,
                entries = value.as_array().map(|a| a.len()).unwrap_or(0),
                "Snapshot loaded from disk"
            );
            Ok(Some(value))
        }
        Ok(_) => {
            warn!(path, "Snapshot is not a JSON array, ignoring it");
            Ok(None)
        }
        Err(e) => {
            warn!(path, error = %e, "Snapshot failed to parse, ignoring it");
            Ok(None)
        }
    }
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

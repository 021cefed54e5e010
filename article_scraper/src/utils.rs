use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PersistError;
use crate::ExtractedRecord;

/// Pretty-printed UTF-8 JSON; non-ASCII text is written as-is. Parent
/// directories are created when missing.
pub fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Best-effort save of a successful record. Failures are logged and
/// swallowed.
pub fn persist_record(record: &ExtractedRecord, path: &Path) -> bool {
    match save_json(record, path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "record saved");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not save record");
            false
        }
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::is_campaign_stem;
use crate::error::IntakeError;
use crate::level::validate_upload;
use crate::level_library::sanitize_level_name;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overwrite {
    /// Fail with `AlreadyExists` so the caller can ask the player.
    Ask,
    Confirmed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredLevel {
    pub name: String,
    pub path: PathBuf,
    pub replaced: bool,
}

/// Reads a user-chosen file and stores it under its own basename.
pub fn import_level_file(
    source: &Path,
    levels_dir: &Path,
    overwrite: Overwrite,
) -> Result<StoredLevel, IntakeError> {
    let text = fs::read_to_string(source).map_err(|error| IntakeError::Io {
        path: source.to_path_buf(),
        source: error,
    })?;
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    store_level_text(&stem, &text, levels_dir, overwrite)
}

/// Validates strictly, then writes `<levels_dir>/<safe name>.txt`. Nothing is
/// written when validation or naming fails.
pub fn store_level_text(
    name: &str,
    text: &str,
    levels_dir: &Path,
    overwrite: Overwrite,
) -> Result<StoredLevel, IntakeError> {
    let map = validate_upload(text)?;

    let safe = sanitize_level_name(name).ok_or_else(|| IntakeError::InvalidName(name.to_string()))?;
    if is_campaign_stem(&safe) {
        return Err(IntakeError::ReservedName(safe));
    }

    let path = levels_dir.join(format!("{safe}.txt"));
    let replaced = path.exists();
    if replaced && overwrite == Overwrite::Ask {
        return Err(IntakeError::AlreadyExists { name: safe, path });
    }

    let io_error = |error: std::io::Error| IntakeError::Io {
        path: path.clone(),
        source: error,
    };
    fs::create_dir_all(levels_dir).map_err(|error| IntakeError::Io {
        path: levels_dir.to_path_buf(),
        source: error,
    })?;
    // Line endings and padding are normalized so the stored file is exactly
    // what the board was validated from.
    fs::write(&path, map.to_text()).map_err(io_error)?;

    info!(name = %safe, path = %path.display(), replaced, "custom level stored");
    Ok(StoredLevel {
        name: safe,
        path,
        replaced,
    })
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::constants::{campaign_file_name, is_campaign_file_name, is_campaign_stem};
use crate::error::GameError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomLevelEntry {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// The `levels/` directory: `level<N>.txt` campaign files plus uploads.
#[derive(Clone, Debug)]
pub struct LevelLibrary {
    dir: PathBuf,
}

impl LevelLibrary {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn campaign_path(&self, ordinal: u32) -> PathBuf {
        self.dir.join(campaign_file_name(ordinal))
    }

    pub fn read_campaign(&self, ordinal: u32) -> Result<String, GameError> {
        let path = self.campaign_path(ordinal);
        fs::read_to_string(&path).map_err(|error| GameError::io(path, error))
    }

    pub fn custom_path(&self, name: &str) -> Option<PathBuf> {
        let safe = sanitize_level_name(name)?;
        if is_campaign_stem(&safe) {
            return None;
        }
        Some(self.dir.join(format!("{safe}.txt")))
    }

    pub fn read_custom(&self, name: &str) -> Result<String, GameError> {
        let Some(path) = self.custom_path(name) else {
            return Err(GameError::io(
                self.dir.join(name),
                io::Error::new(io::ErrorKind::InvalidInput, "not a custom level name"),
            ));
        };
        fs::read_to_string(&path).map_err(|error| GameError::io(path, error))
    }

    /// Uploaded levels sorted by name. A missing directory lists nothing.
    pub fn custom_levels(&self) -> Vec<CustomLevelEntry> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    warn!(dir = %self.dir.display(), %error, "failed to list levels");
                }
                return Vec::new();
            }
        };

        let mut levels: Vec<CustomLevelEntry> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().to_string();
                if !file_name.to_ascii_lowercase().ends_with(".txt")
                    || is_campaign_file_name(&file_name)
                {
                    return None;
                }
                let stem = file_name[..file_name.len() - ".txt".len()].to_string();
                Some(CustomLevelEntry {
                    display_name: display_name(&stem),
                    name: stem,
                    path: entry.path(),
                })
            })
            .collect();
        levels.sort_by(|a, b| a.name.cmp(&b.name));
        levels
    }
}

/// Keeps ASCII alphanumerics, `_` and `-`; `None` when nothing usable is left.
pub fn sanitize_level_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(64)
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// `my_maze` -> `My maze`.
pub fn display_name(stem: &str) -> String {
    let spaced = stem.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::MAX_HIGH_SCORES;

/// Top scores in a flat file, one decimal per line, best first. The file is
/// the only state; every call reads or rewrites it whole.
#[derive(Clone, Debug)]
pub struct HighScoreStore {
    file_path: PathBuf,
    max_entries: usize,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self::with_capacity(file_path, MAX_HIGH_SCORES)
    }

    pub fn with_capacity(file_path: PathBuf, max_entries: usize) -> Self {
        Self {
            file_path,
            max_entries: max_entries.max(1),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Inserts `score` and rewrites the table. Failures are logged and the
    /// table is left as it was.
    pub fn save(&self, score: u32) -> Vec<u32> {
        let mut scores = load_scores(&self.file_path);
        scores.push(score);
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.truncate(self.max_entries);

        if let Err(error) = write_atomically(&self.file_path, &render(&scores)) {
            warn!(
                path = %self.file_path.display(),
                %error,
                "failed to write high scores"
            );
        } else {
            debug!(score, path = %self.file_path.display(), "high score recorded");
        }
        scores
    }

    pub fn scores(&self) -> Vec<u32> {
        let mut scores = load_scores(&self.file_path);
        scores.truncate(self.max_entries);
        scores
    }

    /// `["1. 120", "2. 50", ...]`
    pub fn ranked(&self) -> Vec<String> {
        self.scores()
            .iter()
            .enumerate()
            .map(|(idx, score)| format!("{}. {score}", idx + 1))
            .collect()
    }
}

fn render(scores: &[u32]) -> String {
    scores.iter().map(|score| format!("{score}\n")).collect()
}

fn load_scores(path: &Path) -> Vec<u32> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read high scores");
            }
            return Vec::new();
        }
    };

    let mut scores = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<u32>() {
            Ok(score) => scores.push(score),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    %error,
                    "high score file is corrupt, treating it as empty"
                );
                return Vec::new();
            }
        }
    }
    scores.sort_unstable_by(|a, b| b.cmp(a));
    scores
}

/// Writes a sibling temp file and renames it over `path`.
fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("highscores.txt")
    }

    fn cleanup(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let path = temp_file("high-scores-missing");
        let store = HighScoreStore::new(path.clone());
        assert!(store.scores().is_empty());
        assert!(store.ranked().is_empty());
    }

    #[test]
    fn saves_are_ranked_descending() {
        let path = temp_file("high-scores-ranked");
        let store = HighScoreStore::new(path.clone());
        store.save(50);
        store.save(120);
        store.save(10);
        assert_eq!(store.ranked(), vec!["1. 120", "2. 50", "3. 10"]);
        assert_eq!(
            fs::read_to_string(&path).expect("file written"),
            "120\n50\n10\n"
        );
        cleanup(&path);
    }

    #[test]
    fn table_keeps_top_five() {
        let path = temp_file("high-scores-cap");
        let store = HighScoreStore::new(path.clone());
        for score in [5, 200, 300, 50, 400, 100] {
            store.save(score);
        }
        assert_eq!(store.scores(), vec![400, 300, 200, 100, 50]);
        cleanup(&path);
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let path = temp_file("high-scores-corrupt");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "100\nnot-a-number\n").expect("write file");

        let store = HighScoreStore::new(path.clone());
        assert!(store.scores().is_empty());
        assert_eq!(store.save(30), vec![30]);
        assert_eq!(store.scores(), vec![30]);
        cleanup(&path);
    }

    #[test]
    fn unsorted_file_is_read_in_rank_order() {
        let path = temp_file("high-scores-unsorted");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "10\r\n\r\n90\r\n40\r\n").expect("write file");

        let store = HighScoreStore::new(path.clone());
        assert_eq!(store.scores(), vec![90, 40, 10]);
        cleanup(&path);
    }

    #[test]
    fn unwritable_location_keeps_running() {
        let path = temp_file("high-scores-blocked");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        // A directory where the file should be makes the rename fail.
        fs::create_dir_all(&path).expect("blocking dir");

        let store = HighScoreStore::new(path.clone());
        assert_eq!(store.save(70), vec![70]);
        assert!(store.scores().is_empty());
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn custom_capacity_is_respected() {
        let path = temp_file("high-scores-capacity");
        let store = HighScoreStore::with_capacity(path.clone(), 2);
        store.save(1);
        store.save(3);
        store.save(2);
        assert_eq!(store.scores(), vec![3, 2]);
        cleanup(&path);
    }
}

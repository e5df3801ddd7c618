//! High score persistence
//!
//! `ScoreStore` is the storage collaborator. `JsonFileStore` keeps the table
//! in a JSON file and writes through a temp file so a crash mid-save never
//! leaves a truncated table behind. `MemoryStore` is for tests and headless
//! runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Collaborator;
use crate::highscores::HighScores;
use crate::{Error, Result};

/// Load and save the high score table
pub trait ScoreStore {
    fn load(&mut self) -> Result<HighScores>;
    fn save(&mut self, scores: &HighScores) -> Result<()>;
}

/// High scores in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&mut self) -> Result<HighScores> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No high scores at {}, starting fresh", self.path.display());
                return Ok(HighScores::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut scores: HighScores = serde_json::from_str(&json)?;
        scores.normalize();
        log::info!(
            "Loaded {} high scores from {}",
            scores.len(),
            self.path.display()
        );
        Ok(scores)
    }

    fn save(&mut self, scores: &HighScores) -> Result<()> {
        let json = serde_json::to_string_pretty(scores)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::info!(
            "High scores saved ({} entries) to {}",
            scores.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store; can be told to fail
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub scores: HighScores,
    pub saves: usize,
    pub fail: bool,
}

impl MemoryStore {
    pub fn new(scores: HighScores) -> Self {
        Self {
            scores,
            ..Default::default()
        }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&mut self) -> Result<HighScores> {
        if self.fail {
            return Err(Error::collaborator(Collaborator::Storage, "load refused"));
        }
        Ok(self.scores.clone())
    }

    fn save(&mut self, scores: &HighScores) -> Result<()> {
        if self.fail {
            return Err(Error::collaborator(Collaborator::Storage, "save refused"));
        }
        self.scores = scores.clone();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("asterad-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let mut store = JsonFileStore::new(temp_path("no-such-scores.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("scores.json");
        let mut store = JsonFileStore::new(&path);
        let mut scores = HighScores::new();
        scores.add_score("ACE", 12_000, 3);
        scores.add_score("BOB", 4_000, 1);

        store.save(&scores).unwrap();
        assert!(!store.tmp_path().exists());
        let loaded = store.load().unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, scores);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt-scores.json");
        fs::write(&path, "[[[").unwrap();
        let mut store = JsonFileStore::new(&path);
        let result = store.load();
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            store.save(&HighScores::new()),
            Err(Error::Collaborator {
                collaborator: Collaborator::Storage,
                ..
            })
        ));
        assert_eq!(store.saves, 0);
    }
}

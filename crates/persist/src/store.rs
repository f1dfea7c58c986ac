//! File-backed session store.
//!
//! Layout inside the data directory:
//! ```text
//! session.json   - schema version, restart flag, run history summary
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;
const FILE_NAME: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
}

/// Contents of `session.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub schema_version: u32,
    /// Set by "play again"; the next launch skips the start screen.
    pub restart_requested: bool,
    pub runs: u32,
    pub best_score: u32,
    pub best_rescued: u32,
    pub last_score: Option<u32>,
}

impl Default for RunRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            restart_requested: false,
            runs: 0,
            best_score: 0,
            best_rescued: 0,
            last_score: None,
        }
    }
}

pub struct SessionStore {
    path: PathBuf,
    record: RunRecord,
}

impl SessionStore {
    /// Open the store in `dir`, creating the directory and file as needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(FILE_NAME);

        let record = if path.exists() {
            let record: RunRecord = serde_json::from_reader(std::fs::File::open(&path)?)?;
            if record.schema_version != SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: record.schema_version,
                    expected_version: SCHEMA_VERSION,
                });
            }
            record
        } else {
            let record = RunRecord::default();
            serde_json::to_writer_pretty(std::fs::File::create(&path)?, &record)?;
            record
        };

        tracing::debug!(path = %path.display(), runs = record.runs, "session store opened");
        Ok(Self { path, record })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    pub fn best_score(&self) -> u32 {
        self.record.best_score
    }

    pub fn runs(&self) -> u32 {
        self.record.runs
    }

    pub fn restart_pending(&self) -> bool {
        self.record.restart_requested
    }

    /// Ask the next launch to go straight into a run.
    pub fn request_restart(&mut self) -> Result<(), StoreError> {
        self.record.restart_requested = true;
        self.save()
    }

    /// Read and clear the restart flag.
    pub fn take_restart(&mut self) -> Result<bool, StoreError> {
        if !self.record.restart_requested {
            return Ok(false);
        }
        self.record.restart_requested = false;
        self.save()?;
        Ok(true)
    }

    /// Record a finished run. Returns true when it set a new best score.
    pub fn record_run(&mut self, score: u32, rescued: u32) -> Result<bool, StoreError> {
        self.record.runs += 1;
        self.record.last_score = Some(score);
        let new_best = score > self.record.best_score;
        if new_best {
            self.record.best_score = score;
            self.record.best_rescued = rescued;
        }
        self.save()?;
        tracing::info!(score, rescued, new_best, "run recorded");
        Ok(new_best)
    }

    fn save(&self) -> Result<(), StoreError> {
        serde_json::to_writer_pretty(std::fs::File::create(&self.path)?, &self.record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("data")).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.record(), &RunRecord::default());
    }

    #[test]
    fn restart_flag_is_cleared_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.request_restart().unwrap();

        let mut reopened = SessionStore::open(dir.path()).unwrap();
        assert!(reopened.restart_pending());
        assert!(reopened.take_restart().unwrap());
        assert!(!reopened.take_restart().unwrap());

        let mut again = SessionStore::open(dir.path()).unwrap();
        assert!(!again.take_restart().unwrap());
    }

    #[test]
    fn best_score_only_goes_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        assert!(store.record_run(300, 3).unwrap());
        assert!(!store.record_run(100, 1).unwrap());
        assert!(!store.record_run(300, 3).unwrap());

        let reopened = SessionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.best_score(), 300);
        assert_eq!(reopened.record().best_rescued, 3);
        assert_eq!(reopened.runs(), 3);
        assert_eq!(reopened.record().last_score, Some(300));
    }

    #[test]
    fn schema_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let record = RunRecord {
            schema_version: 99,
            ..RunRecord::default()
        };
        std::fs::write(
            dir.path().join(FILE_NAME),
            serde_json::to_string(&record).unwrap(),
        )
        .unwrap();

        let result = SessionStore::open(dir.path());
        assert!(matches!(
            result,
            Err(StoreError::SchemaMismatch {
                file_version: 99,
                ..
            })
        ));
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "{not json").unwrap();
        assert!(matches!(
            SessionStore::open(dir.path()),
            Err(StoreError::Json(_))
        ));
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use sitesweeper_protocol::{
    COMPLETED_OUTCOME, HAZARD_OUTCOME, ScoreEntry, ScoreSubmission, ValidationError,
    format_duration, sort_by_duration,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Score file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Score file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the caller sent bad data, as opposed to the store failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// Append-only score list kept as a JSON array in a single file.
#[derive(Clone, Debug)]
pub struct ScoreStore {
    path: PathBuf,
}

impl ScoreStore {
    /// Opens the store, creating the file with an empty list if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        store.ensure_file()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_file(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, "[]")?;
            log::info!("Created score file {}", self.path.display());
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        self.ensure_file()?;
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Replaces the file through a rename so readers never see half a write.
    fn write_all(&self, entries: &[ScoreEntry]) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// All entries, fastest first.
    pub fn list(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        let mut entries = self.read_all()?;
        sort_by_duration(&mut entries);
        Ok(entries)
    }

    pub fn append(
        &self,
        submission: &ScoreSubmission,
        now: DateTime<Utc>,
    ) -> Result<ScoreEntry, StoreError> {
        let duration_ms = submission.validate()?;

        let mut entries = self.read_all()?;
        let newest = entries.iter().map(|entry| entry.id).max();
        let id = next_id(u64::try_from(now.timestamp_millis()).unwrap_or(0), newest);

        let entry = build_entry(submission, duration_ms, id, now);
        entries.push(entry.clone());
        self.write_all(&entries)?;
        log::debug!("Stored score {} for {}", entry.id, entry.name);
        Ok(entry)
    }
}

/// Timestamp id, bumped past the newest stored id so ids stay unique.
fn next_id(timestamp_ms: u64, newest: Option<u64>) -> u64 {
    match newest {
        Some(newest) if newest >= timestamp_ms => newest + 1,
        _ => timestamp_ms,
    }
}

fn build_entry(
    submission: &ScoreSubmission,
    duration_ms: f64,
    id: u64,
    now: DateTime<Utc>,
) -> ScoreEntry {
    let difficulty = submission.difficulty.trim().to_owned();
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    ScoreEntry {
        id,
        name: submission.name.trim().to_owned(),
        email: submission.email.trim().to_owned(),
        difficulty_label: non_empty(&submission.difficulty_label)
            .unwrap_or_else(|| difficulty.clone()),
        difficulty,
        outcome: non_empty(&submission.outcome).unwrap_or_else(|| {
            let outcome = if submission.won {
                COMPLETED_OUTCOME
            } else {
                HAZARD_OUTCOME
            };
            outcome.to_owned()
        }),
        won: submission.won,
        duration_ms: Some(duration_ms),
        pretty_duration: format_duration(duration_ms),
        finished_at: non_empty(&submission.finished_at)
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

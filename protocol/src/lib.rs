//! Messages exchanged with the score service.
//!
//! Every message is one JSON object on one line, tagged by `type`.

use core::cmp::Ordering;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const LEADERBOARD_LIMIT: usize = 20;
pub const HAZARD_OUTCOME: &str = "Hazard";
pub const COMPLETED_OUTCOME: &str = "Completed map";

/// A player claiming the result of a finished run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreSubmission {
    pub name: String,
    pub email: String,
    pub difficulty: String,
    pub difficulty_label: Option<String>,
    pub outcome: Option<String>,
    pub won: bool,
    pub duration_ms: Option<f64>,
    pub finished_at: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field `{0}`")]
    Missing(&'static str),
    #[error("Duration must be a finite, non-negative number of milliseconds")]
    InvalidDuration,
}

impl ScoreSubmission {
    /// Checks the fields the store requires. Returns the usable duration.
    pub fn validate(&self) -> Result<f64, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Missing("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Missing("email"));
        }
        if self.difficulty.trim().is_empty() {
            return Err(ValidationError::Missing("difficulty"));
        }
        match self.duration_ms {
            None => Err(ValidationError::Missing("durationMs")),
            Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms),
            Some(_) => Err(ValidationError::InvalidDuration),
        }
    }
}

/// One persisted leaderboard row.
///
/// Rows read back from disk may miss fields, so everything past the id defaults.
/// A duration that is not a number reads as missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub difficulty_label: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub won: bool,
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub pretty_duration: String,
    #[serde(default)]
    pub finished_at: String,
}

fn lenient_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(ms) => ms.as_f64(),
        _ => None,
    })
}

impl ScoreEntry {
    /// Duration usable for ranking, `None` when missing or not finite.
    pub fn ranked_duration(&self) -> Option<f64> {
        self.duration_ms.filter(|ms| ms.is_finite())
    }

    pub fn display_duration(&self) -> String {
        if self.pretty_duration.is_empty() {
            format_duration(self.duration_ms.unwrap_or(f64::NAN))
        } else {
            self.pretty_duration.clone()
        }
    }
}

/// Ascending by duration, rows without a usable duration last. Stable.
pub fn sort_by_duration(entries: &mut [ScoreEntry]) {
    entries.sort_by(|a, b| match (a.ranked_duration(), b.ranked_duration()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// `mm:ss` of the rounded second count, a dash placeholder for non-finite input.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() {
        return "—".to_owned();
    }
    let total_seconds = (ms / 1000.0).round().max(0.0) as u64;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    SubmitScore(ScoreSubmission),
    ListScores,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    BadRequest,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    ScoreCreated { entry: ScoreEntry },
    Scores { entries: Vec<ScoreEntry> },
    Error { code: ErrorCode, message: String },
}

impl Response {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Error {
            code: ErrorCode::BadRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Error {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

/// Encodes a message as one newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

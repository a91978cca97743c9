use sitesweeper_core::ResultRecord;
use sitesweeper_protocol::{ErrorCode, Request, Response, ScoreEntry, ScoreSubmission, encode_line};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Score service unreachable: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Score service timed out")]
    Timeout,
    #[error("Score service closed the connection")]
    Closed,
    #[error("Score rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },
    #[error("Unexpected reply from score service")]
    UnexpectedResponse,
}

/// Builds the claim for a finished run.
pub fn claim_submission(record: &ResultRecord, name: &str, email: &str) -> ScoreSubmission {
    ScoreSubmission {
        name: name.trim().to_owned(),
        email: email.trim().to_owned(),
        difficulty: record.difficulty_id.clone(),
        difficulty_label: Some(record.difficulty_label.clone()),
        outcome: Some(record.outcome.clone()),
        won: record.won,
        duration_ms: Some(record.duration_ms as f64),
        finished_at: Some(record.finished_at.to_rfc3339()),
    }
}

/// Connects per request and exchanges a single line each way.
#[derive(Clone, Debug)]
pub struct ScoreClient {
    addr: String,
    timeout: Duration,
}

impl ScoreClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn round_trip(&self, request: &Request) -> Result<Response, ClientError> {
        let exchange = async {
            let stream = TcpStream::connect(self.addr.as_str()).await?;
            let (read_half, mut write_half) = stream.into_split();
            write_half.write_all(encode_line(request)?.as_bytes()).await?;
            write_half.flush().await?;

            let mut lines = BufReader::new(read_half).lines();
            let line = lines.next_line().await?.ok_or(ClientError::Closed)?;
            Ok::<Response, ClientError>(serde_json::from_str(&line)?)
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ClientError::Timeout)??;
        match response {
            Response::Error { code, message } => Err(ClientError::Rejected { code, message }),
            response => Ok(response),
        }
    }

    pub async fn submit(&self, submission: ScoreSubmission) -> Result<ScoreEntry, ClientError> {
        match self.round_trip(&Request::SubmitScore(submission)).await? {
            Response::ScoreCreated { entry } => Ok(entry),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn list(&self) -> Result<Vec<ScoreEntry>, ClientError> {
        match self.round_trip(&Request::ListScores).await? {
            Response::Scores { entries } => Ok(entries),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionState {
    Pending,
    Succeeded(ScoreEntry),
    Failed(String),
}

impl SubmissionState {
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Background score submission observed through its state.
///
/// Gameplay never waits on it; callers poll [`SubmissionTask::state`] or await
/// [`SubmissionTask::finished`].
#[derive(Debug)]
pub struct SubmissionTask {
    state: watch::Receiver<SubmissionState>,
    handle: JoinHandle<()>,
}

impl SubmissionTask {
    /// Must be called from within a tokio runtime.
    pub fn spawn(client: ScoreClient, submission: ScoreSubmission) -> Self {
        let (tx, rx) = watch::channel(SubmissionState::Pending);
        let handle = tokio::spawn(async move {
            let state = match client.submit(submission).await {
                Ok(entry) => {
                    log::info!("Score {} saved", entry.id);
                    SubmissionState::Succeeded(entry)
                }
                Err(err) => {
                    log::warn!("Score submission to {} failed: {}", client.addr(), err);
                    SubmissionState::Failed(err.to_string())
                }
            };
            let _ = tx.send(state);
        });
        Self { state: rx, handle }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub async fn finished(&mut self) -> SubmissionState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if !current.is_pending() {
                return current;
            }
            if self.state.changed().await.is_err() {
                let last = self.state.borrow().clone();
                return if last.is_pending() {
                    SubmissionState::Failed("Submission task stopped".into())
                } else {
                    last
                };
            }
        }
    }

    /// Abandons the claim.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::{TempDir, tempdir};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use sitesweeper_protocol::{ErrorCode, Response, ScoreSubmission};
use sitesweeper_server::{
    ClientError, ScoreClient, ServiceConfig, SubmissionState, SubmissionTask, run_service,
};

/// The returned directory holds the data file and must outlive the test.
async fn start_service() -> (SocketAddr, TempDir) {
    let dir = tempdir().expect("temp dir");
    let config = ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_file: dir.path().join("scores.json"),
    };
    let (ready_tx, ready_rx) = oneshot::channel();

    tokio::spawn(async move {
        let _ = run_service(config, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("service did not signal ready")
        .expect("ready channel dropped");
    (addr, dir)
}

fn submission(name: &str, duration_ms: f64) -> ScoreSubmission {
    ScoreSubmission {
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        difficulty: "easy".into(),
        difficulty_label: Some("Easy".into()),
        won: true,
        duration_ms: Some(duration_ms),
        ..Default::default()
    }
}

#[tokio::test]
async fn submitted_scores_come_back_sorted() {
    let (addr, _dir) = start_service().await;
    let client = ScoreClient::new(addr.to_string());

    client.submit(submission("Slow", 300_000.0)).await.unwrap();
    let fast = client.submit(submission("Fast", 45_000.0)).await.unwrap();
    assert_eq!(fast.pretty_duration, "00:45");

    let entries = client.list().await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Fast", "Slow"]);
}

#[tokio::test]
async fn invalid_submission_is_rejected_without_write() {
    let (addr, _dir) = start_service().await;
    let client = ScoreClient::new(addr.to_string());

    let mut bad = submission("Nameless", 1_000.0);
    bad.name = String::new();
    let err = client.submit(bad).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Rejected {
            code: ErrorCode::BadRequest,
            ..
        }
    ));
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn submission_task_reports_success() {
    let (addr, _dir) = start_service().await;
    let client = ScoreClient::new(addr.to_string());

    let mut task = SubmissionTask::spawn(client.clone(), submission("Async", 12_000.0));
    let entry = match task.finished().await {
        SubmissionState::Succeeded(entry) => entry,
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(entry.name, "Async");
    assert_eq!(client.list().await.unwrap(), vec![entry]);
}

#[tokio::test]
async fn malformed_line_gets_error_reply() {
    let (addr, _dir) = start_service().await;

    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(b"{\"type\":\"dance\"}\n").await.unwrap();
    write_half.flush().await.unwrap();

    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("expected a reply line");
    let response: Response = serde_json::from_str(&line).unwrap();
    assert!(matches!(
        response,
        Response::Error {
            code: ErrorCode::BadRequest,
            ..
        }
    ));
}

#[tokio::test]
async fn keeps_serving_after_a_client_drops() {
    let (addr, _dir) = start_service().await;

    drop(TcpStream::connect(addr).await.expect("connect failed"));

    let client = ScoreClient::new(addr.to_string());
    assert!(client.list().await.unwrap().is_empty());
    client.submit(submission("After", 2_000.0)).await.unwrap();
    assert_eq!(client.list().await.unwrap().len(), 1);
}

use chrono::Utc;
use sitesweeper_protocol::{Request, Response, encode_line};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::{ScoreStore, StoreError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5173,
            data_file: PathBuf::from("scores.json"),
        }
    }
}

/// Request handling shared by every connection.
///
/// File access is serialized behind one lock and kept off the async workers.
#[derive(Clone, Debug)]
pub struct ScoreService {
    store: Arc<Mutex<ScoreStore>>,
}

impl ScoreService {
    pub fn new(store: ScoreStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                log::debug!("Unparseable request: {}", err);
                Response::bad_request(format!("Malformed request: {err}"))
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            let store = match store.lock() {
                Ok(store) => store,
                Err(poisoned) => poisoned.into_inner(),
            };
            match request {
                Request::SubmitScore(submission) => store
                    .append(&submission, Utc::now())
                    .map(|entry| Response::ScoreCreated { entry }),
                Request::ListScores => store.list().map(|entries| Response::Scores { entries }),
            }
        })
        .await;

        match result {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => error_response(&err),
            Err(err) => {
                log::error!("Store task failed: {}", err);
                Response::internal("Unable to reach the score store.")
            }
        }
    }
}

fn error_response(err: &StoreError) -> Response {
    if err.is_client_error() {
        Response::bad_request(err.to_string())
    } else {
        log::error!("Score store error: {}", err);
        Response::internal("Unable to access the score store.")
    }
}

/// Binds the listener and serves until the task is dropped.
///
/// `ready` receives the bound address, which matters when binding port 0.
pub async fn run_service(
    config: ServiceConfig,
    ready: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let store = ScoreStore::open(&config.data_file)?;
    let service = ScoreService::new(store);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    log::info!(
        "Score service listening on {} (data file {})",
        addr,
        config.data_file.display()
    );
    if let Some(ready) = ready {
        let _ = ready.send(addr);
    }

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                log::warn!("Accept failed: {}", err);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(stream, &service).await {
                log::debug!("Connection {} closed with error: {}", peer, err);
            }
        });
    }
}

/// One response line per request line until the peer hangs up.
async fn serve_connection(stream: TcpStream, service: &ScoreService) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = service.handle_line(&line).await;
        write_half.write_all(encode_line(&response)?.as_bytes()).await?;
        write_half.flush().await?;
    }
    Ok(())
}

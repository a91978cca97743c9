use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use sitesweeper_core::Difficulty;
use sitesweeper_server::ScoreClient;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{App, Flow};
use crate::command::Command;

mod app;
mod command;
mod view;

/// Site Sweeper: scout the parcel without hitting a hazard.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Starting difficulty: easy, medium or hard
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Seed for reproducible maps
    #[arg(long)]
    seed: Option<u64>,

    /// Score service address
    #[arg(long, default_value = "127.0.0.1:5173")]
    server: String,

    /// How long a hint stays highlighted, in milliseconds
    #[arg(long, default_value_t = 1500)]
    hint_ms: u64,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

/// Prints the outcome of a command. Returns `false` when the player quits.
async fn present(app: &App, flow: Flow) -> bool {
    match flow {
        Flow::Continue(messages) => {
            for message in messages {
                println!("{message}");
            }
            true
        }
        Flow::ShowLeaderboard(messages) => {
            for message in messages {
                println!("{message}");
            }
            match app.client().list().await {
                Ok(entries) => println!("{}", view::render_leaderboard(&entries)),
                Err(err) => {
                    log::warn!("Leaderboard fetch failed: {}", err);
                    println!("Could not load the leaderboard.");
                }
            }
            true
        }
        Flow::Quit => false,
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let client = ScoreClient::new(args.server);
    let mut app = App::new(
        args.difficulty,
        args.seed,
        client,
        Duration::from_millis(args.hint_ms),
    )?;

    println!("Tap a tile to scout it! Type `help` for commands.");
    println!("{}", app.render(Instant::now()));
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let flow = match Command::parse(&line) {
                    Ok(command) => app
                        .handle(command, Instant::now())
                        .unwrap_or_else(|err| Flow::Continue(vec![err.to_string()])),
                    Err(err) => Flow::Continue(vec![err.to_string()]),
                };
                if !present(&app, flow).await {
                    break;
                }
                prompt();
            }
            _ = ticker.tick() => {
                if let Some(flow) = app.poll_claim() {
                    println!();
                    present(&app, flow).await;
                    prompt();
                }
            }
        }
    }
    Ok(())
}

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use sitesweeper_server::{ServiceConfig, run_service};
use std::path::PathBuf;

/// Score storage service for Site Sweeper.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 5173)]
    port: u16,

    /// JSON file holding the score list
    #[arg(long, default_value = "scores.json")]
    data_file: PathBuf,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = ServiceConfig {
        host: args.host,
        port: args.port,
        data_file: args.data_file,
    };
    run_service(config, None).await
}

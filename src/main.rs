//! Entry point for `ftp-over-udp`.
//!
//! Parses CLI arguments and dispatches into either **serve** or **client**
//! mode.  All protocol work is delegated to library modules; `main.rs` owns
//! only process setup (logging, argument parsing, directory creation).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use ftp_over_udp::channel::{Channel, LossyChannel};
use ftp_over_udp::session::{self, TransferConfig};
use ftp_over_udp::socket::Socket;
use ftp_over_udp::timer::RetryPolicy;

/// Stop-and-wait reliable file transfer over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Probability in [0.0, 1.0] of silently dropping each outbound packet.
    #[arg(long, default_value_t = 0.0)]
    loss: f64,

    /// Seed for the loss RNG (reproducible runs); random if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// ACK wait before each retransmission, in milliseconds.
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Retransmissions per chunk before giving up; 0 means retry forever.
    #[arg(long, default_value_t = 20)]
    max_retries: u32,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run as a responder, serving GETs and accepting uploads.
    Serve {
        /// Local address to bind (e.g. 0.0.0.0:12000).
        #[arg(short, long, default_value = "0.0.0.0:12000")]
        bind: SocketAddr,

        /// Directory served to GETs and holding persisted uploads.
        #[arg(short, long, default_value = "server_files")]
        dir: PathBuf,
    },
    /// Run as an initiator: upload a file, then fetch it back.
    Client {
        /// Responder address (e.g. 127.0.0.1:12000).
        #[arg(short, long)]
        server: SocketAddr,

        /// Directory holding the file to upload and the saved download.
        #[arg(short, long, default_value = "client_files")]
        dir: PathBuf,

        /// Name of the file to upload and then request back.
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let config = TransferConfig {
        retry: RetryPolicy::fixed(
            Duration::from_millis(cli.timeout_ms),
            (cli.max_retries > 0).then_some(cli.max_retries),
        ),
        ..TransferConfig::default()
    };

    let result = match cli.mode {
        Mode::Serve { bind, dir } => run_serve(bind, dir, cli.loss, cli.seed, config).await,
        Mode::Client { server, dir, file } => {
            run_client(server, dir, file, cli.loss, cli.seed, config).await
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run_serve(
    bind: SocketAddr,
    dir: PathBuf,
    loss: f64,
    seed: Option<u64>,
    config: TransferConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&dir)?;
    let socket = Socket::bind(bind).await?;
    log::info!(
        "listening on {} serving '{}' (loss={:.0}%)",
        socket.local_addr,
        dir.display(),
        loss * 100.0
    );
    let channel = lossy(socket, loss, seed);
    session::serve(&channel, &dir, &config).await?;
    Ok(())
}

async fn run_client(
    server: SocketAddr,
    dir: PathBuf,
    file: String,
    loss: f64,
    seed: Option<u64>,
    config: TransferConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&dir)?;
    let socket = Socket::bind("0.0.0.0:0".parse().unwrap()).await?;
    let channel = lossy(socket, loss, seed);
    let saved = session::exchange(&channel, server, &dir, &file, &config).await?;
    println!("download saved as {}", saved.display());
    Ok(())
}

/// Wrap the socket in the loss decorator (a pass-through when `loss` is 0).
fn lossy(socket: Socket, loss: f64, seed: Option<u64>) -> impl Channel {
    match seed {
        Some(seed) => LossyChannel::with_seed(socket, loss, seed),
        None => LossyChannel::new(socket, loss),
    }
}

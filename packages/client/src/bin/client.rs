//! Relaycast participant client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaycast-client -- --role broadcaster
//! cargo run --bin relaycast-client -- -r viewer -u ws://127.0.0.1:3001/ws
//! ```

use clap::Parser;
use relaycast_client::{ClientOptions, Role, run_client};
use relaycast_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaycast-client")]
#[command(about = "Broadcaster or viewer peer for the Relaycast signaling relay", long_about = None)]
struct Args {
    /// Side of the broadcast to play
    #[arg(short = 'r', long, value_enum)]
    role: Role,

    /// Relay WebSocket URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3001/ws")]
    url: String,

    /// Camera available to the media engine (repeatable, first is the default)
    #[arg(short = 'c', long = "camera", default_values = ["front", "back"])]
    cameras: Vec<String>,

    /// Refuse camera access, as if the user denied the permission prompt
    #[arg(long)]
    deny_camera: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for ClientOptions {
    fn from(args: Args) -> Self {
        Self {
            url: args.url,
            role: args.role,
            cameras: args.cameras,
            deny_camera: args.deny_camera,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run_client(ClientOptions::from(args)).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

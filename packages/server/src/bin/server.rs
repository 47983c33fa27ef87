//! Relaycast signaling relay.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaycast-server
//! cargo run --bin relaycast-server -- --host 0.0.0.0 --port 3001
//! ```

use clap::Parser;
use relaycast_server::{ServerConfig, build_server, config::{DEFAULT_COMMAND_QUEUE, DEFAULT_OUTBOUND_QUEUE}};
use relaycast_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaycast-server")]
#[command(about = "WebRTC signaling relay for one broadcaster and many viewers", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3001")]
    port: u16,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_QUEUE)]
    outbound_queue: usize,

    /// Capacity of the dispatcher's command queue
    #[arg(long, default_value_t = DEFAULT_COMMAND_QUEUE)]
    command_queue: usize,

    /// Do not notify a displaced broadcaster and its viewers on takeover
    #[arg(long)]
    no_takeover_notice: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            outbound_queue: args.outbound_queue,
            command_queue: args.command_queue,
            takeover_notice: !args.no_takeover_notice,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::from(args);
    let server = build_server(&config);
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

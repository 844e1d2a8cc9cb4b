//! Charla CLI binary: chat from the terminal, or run the server.

use clap::{Parser, Subcommand};
use cli::{build_transport, DEFAULT_API_URL, DEFAULT_WS_URL};

#[derive(Parser, Debug)]
#[command(name = "charla")]
#[command(about = "Charla: chat with the model from the terminal")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Transport: "api" (request/response) or "ws" (streaming)
    #[arg(short, long, value_name = "KIND")]
    transport: Option<String>,

    /// Chat endpoint for the api transport
    #[arg(long, value_name = "URL", env = "CHARLA_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// WebSocket endpoint for the ws transport
    #[arg(long, value_name = "URL", env = "CHARLA_WS_URL", default_value = DEFAULT_WS_URL)]
    ws_url: String,

    /// One-shot message: send, print the reply, exit (default: interactive REPL)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the charla server
    Serve {
        /// Listen address (default 127.0.0.1:3001, or PORT)
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Err(e) = config::load_and_apply("charla", None) {
        eprintln!("config: {e}");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(Command::Serve { addr }) = args.cmd {
        serve::run_serve(addr.as_deref()).await?;
        return Ok(());
    }

    let transport = build_transport(args.transport.as_deref(), &args.api_url, &args.ws_url);
    match args.message {
        Some(message) => cli::repl::run_one_shot(transport, &message).await,
        None => cli::repl::run_repl(transport).await,
    }
}

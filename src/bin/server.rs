use anyhow::Result;
use clap::Parser;

use quote_service::server::{Config, Server};

#[derive(Parser)]
#[command(name = "server", about = "Quote HTTP/websocket demo server")]
struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Optional requests-per-second cap on the quote endpoints
    #[arg(long, env = "RPS")]
    rps: Option<usize>,

    /// Path the OpenAPI document is served under
    #[arg(
        long,
        env = "OPENAPI_PATH",
        default_value = "/.ambassador-internal/openapi-docs"
    )]
    openapi_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let server = Server::new(Config {
        host: args.host,
        port: args.port,
        rps: args.rps,
        openapi_path: args.openapi_path,
    });

    // Ctrl-C exits immediately; SIGTERM is handled by the server itself
    // (it marks the health check unready and waits to be killed).
    tokio::spawn(async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutting down");
        std::process::exit(0);
    });

    server.listen_and_serve().await
}

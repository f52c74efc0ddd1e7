use anyhow::Result;
use clap::Parser;
use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser)]
#[command(name = "client", about = "Subscribe to the quote stream")]
struct Args {
    /// Websocket endpoint of the quote server
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (ws, _) = connect_async(args.url.as_str()).await?;
    eprintln!("[client] connected to {}", args.url);

    // The read half replies to server pings on its own; coalesced frames
    // carry one quote per line.
    let (_write, mut read) = ws.split();
    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => {
                for quote in text.lines() {
                    println!("{quote}");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    eprintln!("[client] server closed the stream");
    Ok(())
}

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

use super::hub::{ClientHandle, HubCommand, SEND_BUF};

/// Time allowed to write a frame to the peer.
pub const WRITE_WAIT: Duration = Duration::from_secs(10);

/// Time allowed between inbound frames (pongs included) before the peer
/// is considered gone.
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// Ping period. Must be shorter than PONG_WAIT.
pub const PING_PERIOD: Duration = Duration::from_millis(PONG_WAIT.as_millis() as u64 * 9 / 10);

/// Maximum frame size accepted from the peer.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Bridge one upgraded socket to the hub: register, run the two pumps,
/// unregister once either side gives up. Unregistering is idempotent,
/// so it is safe even when the hub already evicted us.
pub async fn serve_socket(id: u64, hub_tx: mpsc::Sender<HubCommand>, socket: WebSocket) {
    let (send_tx, send_rx) = mpsc::channel::<Vec<u8>>(SEND_BUF);
    if hub_tx
        .send(HubCommand::Register(ClientHandle { id, tx: send_tx }))
        .await
        .is_err()
    {
        return;
    }

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_pump(send_rx, sink));
    let mut reader = tokio::spawn(read_pump(stream));

    tokio::select! {
        // Writer gone (write failure or hub-side closure): the peer is
        // no longer reachable, stop reading.
        _ = &mut writer => reader.abort(),
        // Reader gone: unregistering below closes the queue, which lets
        // the writer send its close frame and finish on its own.
        _ = &mut reader => {}
    }

    hub_tx.send(HubCommand::Unregister(id)).await.ok();
    tracing::debug!(id, "stream closed");
}

/// Read pump. The stream is broadcast-only, so inbound frames matter
/// only as liveness: any frame refreshes the read deadline. Oversized
/// frames, close frames, read errors, and deadline expiry all end the
/// connection.
async fn read_pump<S>(mut stream: S)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match time::timeout(PONG_WAIT, stream.next()).await {
            Err(_) => {
                tracing::debug!("read deadline expired");
                return;
            }
            Ok(None) => return,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "read error");
                return;
            }
            Ok(Some(Ok(msg))) => match msg {
                Message::Close(_) => return,
                Message::Text(ref text) if text.len() > MAX_MESSAGE_SIZE => {
                    tracing::warn!(len = text.len(), "oversized message from peer");
                    return;
                }
                Message::Binary(ref data) if data.len() > MAX_MESSAGE_SIZE => {
                    tracing::warn!(len = data.len(), "oversized message from peer");
                    return;
                }
                _ => {}
            },
        }
    }
}

/// Write pump: drains the send queue onto the wire and keeps the peer
/// alive with periodic pings. Queue closure is the termination signal
/// from the hub; everything else that ends the loop is a write failure.
async fn write_pump<W>(mut rx: mpsc::Receiver<Vec<u8>>, mut sink: W)
where
    W: Sink<Message> + Unpin,
{
    let mut ticker = time::interval_at(Instant::now() + PING_PERIOD, PING_PERIOD);

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                // The hub dropped our handle: tell the peer and stop.
                None => {
                    time::timeout(WRITE_WAIT, sink.send(Message::Close(None))).await.ok();
                    return;
                }
                Some(payload) => {
                    let frame = coalesce(payload, &mut rx);
                    let text = String::from_utf8_lossy(&frame).into_owned();
                    match time::timeout(WRITE_WAIT, sink.send(Message::Text(text))).await {
                        Ok(Ok(())) => {}
                        _ => return,
                    }
                }
            },
            _ = ticker.tick() => {
                match time::timeout(WRITE_WAIT, sink.send(Message::Ping(Vec::new()))).await {
                    Ok(Ok(())) => {}
                    _ => return,
                }
            }
        }
    }
}

/// Fold every message already sitting in the queue into the current
/// frame, newline-separated, to save per-message framing overhead.
fn coalesce(mut frame: Vec<u8>, rx: &mut mpsc::Receiver<Vec<u8>>) -> Vec<u8> {
    while let Ok(next) = rx.try_recv() {
        frame.push(b'\n');
        frame.extend_from_slice(&next);
    }
    frame
}

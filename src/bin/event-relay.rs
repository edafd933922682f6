//! Fan-out relay for live change events.
//!
//! Every client connected to the relay receives every valid event frame any
//! client sends. Frames that do not decode as a known change event are not
//! forwarded; the sender gets an error frame back instead.

use campus_api::events;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::env;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const DEFAULT_BIND: &str = "0.0.0.0:8788";

#[derive(Debug, Serialize)]
struct RejectFrame<'a> {
    event: &'static str,
    data: RejectData<'a>,
}

#[derive(Debug, Serialize)]
struct RejectData<'a> {
    message: &'a str,
}

fn reject_frame(message: &str) -> anyhow::Result<String> {
    let frame = RejectFrame { event: "error", data: RejectData { message } };
    Ok(serde_json::to_string(&frame)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("CAMPUS_RELAY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&addr).await?;
    let (tx, _rx) = broadcast::channel::<String>(512);

    eprintln!("event relay listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let tx = tx.clone();
        let rx = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, tx, rx).await {
                eprintln!("client {peer} disconnected: {e}");
            }
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    tx: broadcast::Sender<String>,
    mut rx: broadcast::Receiver<String>,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match events::decode(text.as_str()) {
                        Ok(event) => {
                            eprintln!("relaying {}", event.name());
                            let _ = tx.send(text.to_string());
                        }
                        Err(e) => {
                            eprintln!("rejected frame: {e}");
                            let reply = reject_frame(&e.to_string())?;
                            write.send(Message::Text(reply.into())).await?;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(text) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        eprintln!("client lagging, skipped {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

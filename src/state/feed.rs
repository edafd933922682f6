use campus_api::events::{self, LiveEvent};
use futures_util::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    Change(LiveEvent),
    Error(String),
    /// Reconnect budget exhausted; the worker has stopped.
    GaveUp,
}

/// A feed event tagged with the session generation that opened the feed.
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub generation: u64,
    pub event: FeedEvent,
}

/// Spawns one feed worker per mounted view.
#[derive(Debug, Clone)]
pub struct FeedLauncher {
    pub url: String,
    pub max_retries: u32,
    pub events: mpsc::Sender<FeedMessage>,
}

impl FeedLauncher {
    pub fn launch(&self, generation: u64) -> FeedHandle {
        let worker = FeedWorker {
            url: self.url.clone(),
            generation,
            max_retries: self.max_retries,
            retry_delay: RETRY_DELAY,
            events: self.events.clone(),
        };
        FeedHandle { generation, task: tokio::spawn(worker.run()) }
    }
}

/// Owned handle to a running feed worker. Dropping it stops the worker.
#[derive(Debug)]
pub struct FeedHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        debug!("closing feed for generation {}", self.generation);
        self.task.abort();
    }
}

#[derive(Debug)]
pub struct FeedWorker {
    pub url: String,
    pub generation: u64,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub events: mpsc::Sender<FeedMessage>,
}

impl FeedWorker {
    pub async fn run(self) {
        let mut failures = 0;
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((mut stream, _)) => {
                    if !self.emit(FeedEvent::Connected).await {
                        return;
                    }

                    while let Some(inbound) = stream.next().await {
                        match inbound {
                            Ok(Message::Text(text)) => match events::decode(text.as_str()) {
                                Ok(event) => {
                                    // Only a connection that delivers events earns a fresh retry budget.
                                    failures = 0;
                                    if !self.emit(FeedEvent::Change(event)).await {
                                        return;
                                    }
                                }
                                Err(e) => warn!("dropping feed frame: {e}"),
                            },
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                self.emit(FeedEvent::Error(format!("feed read failed: {e}"))).await;
                                break;
                            }
                        }
                    }

                    if !self.emit(FeedEvent::Disconnected).await {
                        return;
                    }
                }
                Err(e) => {
                    if !self.emit(FeedEvent::Error(format!("feed connect failed: {e}"))).await {
                        return;
                    }
                }
            }

            failures += 1;
            if failures > self.max_retries {
                self.emit(FeedEvent::GaveUp).await;
                return;
            }
            sleep(self.retry_delay).await;
        }
    }

    /// False once the receiving side has gone away.
    async fn emit(&self, event: FeedEvent) -> bool {
        self.events
            .send(FeedMessage { generation: self.generation, event })
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    #[tokio::test]
    async fn unreachable_feed_gives_up_after_retry_budget() {
        let (tx, mut rx) = mpsc::channel(16);
        let worker = FeedWorker {
            url: "ws://127.0.0.1:9".to_string(),
            generation: 7,
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            events: tx,
        };
        worker.run().await;

        let mut seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            assert_eq!(msg.generation, 7);
            seen.push(msg.event);
        }
        assert_eq!(seen.len(), 3, "two failed attempts then give up: {seen:?}");
        assert!(matches!(seen[0], FeedEvent::Error(_)));
        assert!(matches!(seen[2], FeedEvent::GaveUp));
    }

    async fn drain(rx: &mut mpsc::Receiver<FeedMessage>) -> Vec<FeedEvent> {
        let mut seen = Vec::new();
        while let Some(msg) = rx.recv().await {
            seen.push(msg.event);
        }
        seen
    }

    #[tokio::test]
    async fn relay_that_drops_every_connection_still_gives_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = accept_async(stream).await {
                    drop(ws);
                }
            }
        });

        let (tx, mut rx) = mpsc::channel(64);
        let worker = FeedWorker {
            url: format!("ws://{addr}"),
            generation: 3,
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            events: tx,
        };
        timeout(Duration::from_secs(5), worker.run())
            .await
            .expect("worker kept reconnecting past its retry budget");
        relay.abort();

        let seen = drain(&mut rx).await;
        let connects = seen.iter().filter(|e| matches!(e, FeedEvent::Connected)).count();
        assert_eq!(connects, 3, "first attempt plus two retries: {seen:?}");
        assert!(matches!(seen.last(), Some(FeedEvent::GaveUp)));
    }

    #[tokio::test]
    async fn delivered_events_reset_the_retry_budget() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Each connection sends one valid frame before closing, so the
        // worker never runs out of retries on its own.
        let relay = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(mut ws) = accept_async(stream).await {
                    let frame = r#"{"event": "matchDeleted", "data": "m1"}"#;
                    let _ = ws.send(Message::Text(frame.into())).await;
                    let _ = ws.close(None).await;
                }
            }
        });

        let (tx, mut rx) = mpsc::channel(64);
        let worker = FeedWorker {
            url: format!("ws://{addr}"),
            generation: 4,
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            events: tx,
        };
        let handle = tokio::spawn(worker.run());

        let mut changes = 0;
        while changes < 3 {
            match timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Some(FeedMessage { event: FeedEvent::Change(_), .. })) => changes += 1,
                Ok(Some(FeedMessage { event: FeedEvent::GaveUp, .. })) => {
                    panic!("gave up although every connection delivered an event")
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => panic!("feed stopped after {changes} events"),
            }
        }
        handle.abort();
        relay.abort();
    }
}

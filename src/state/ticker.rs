use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Once-a-second tick that expires status-line notifications.
pub struct Ticker {
    ui_events: mpsc::Sender<UiEvent>,
}

impl Ticker {
    pub fn new(ui_events: mpsc::Sender<UiEvent>) -> Self {
        Self { ui_events }
    }

    pub async fn run(self) {
        let mut ticks = interval(Duration::from_secs(1));
        // The first tick fires immediately; startup already draws.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            if self.ui_events.send(UiEvent::Tick).await.is_err() {
                break;
            }
        }
    }
}

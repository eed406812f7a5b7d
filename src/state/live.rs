use futures_util::{SinkExt, StreamExt};
use log::debug;
use padel_core::relay::{RelayCommand, RelayEvent};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum LiveEvent {
    Connected,
    Disconnected,
    Relay(RelayEvent),
    Error(String),
}

/// Mirrors local scoring to the score relay and streams every court's score back.
///
/// Commands issued while disconnected are dropped: on each (re)connect the app
/// answers `LiveEvent::Connected` with a full `open`, which replaces the
/// relay's state for the match.
#[derive(Debug)]
pub struct LiveWorker {
    pub url: String,
    pub commands: mpsc::Receiver<RelayCommand>,
    pub events: mpsc::Sender<LiveEvent>,
}

impl LiveWorker {
    pub async fn run(mut self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    let _ = self.events.send(LiveEvent::Connected).await;
                    let (mut write, mut read) = stream.split();

                    loop {
                        tokio::select! {
                            maybe_cmd = self.commands.recv() => {
                                let Some(cmd) = maybe_cmd else {
                                    return;
                                };
                                if let Err(e) = send_command(&mut write, &cmd).await {
                                    let _ = self.events.send(LiveEvent::Error(format!("relay send failed: {e}"))).await;
                                    let _ = self.events.send(LiveEvent::Disconnected).await;
                                    break;
                                }
                            }
                            inbound = read.next() => {
                                match inbound {
                                    Some(Ok(Message::Text(text))) => {
                                        match serde_json::from_str::<RelayEvent>(&text) {
                                            Ok(event) => {
                                                let _ = self.events.send(LiveEvent::Relay(event)).await;
                                            }
                                            Err(e) => {
                                                let _ = self.events.send(LiveEvent::Error(format!("relay parse error: {e}"))).await;
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => {
                                        let _ = self.events.send(LiveEvent::Disconnected).await;
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        let _ = self.events.send(LiveEvent::Error(format!("relay read failed: {e}"))).await;
                                        let _ = self.events.send(LiveEvent::Disconnected).await;
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = self
                        .events
                        .send(LiveEvent::Error(format!("relay connect failed: {e}")))
                        .await;
                    let _ = self.events.send(LiveEvent::Disconnected).await;
                }
            }

            let mut dropped = 0usize;
            loop {
                match self.commands.try_recv() {
                    Ok(_) => dropped += 1,
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => return,
                }
            }
            if dropped > 0 {
                debug!("dropped {dropped} relay commands while offline");
            }
            sleep(RECONNECT_DELAY).await;
        }
    }
}

async fn send_command<S>(write: &mut S, cmd: &RelayCommand) -> Result<(), String>
where
    S: futures_util::sink::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(cmd).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use padel_core::relay::{MatchHub, RelayCommand, RelayEvent};
use std::env;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_BIND: &str = "0.0.0.0:8788";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let addr = env::var("PADELFLOW_RELAY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&addr).await?;
    let (events, _rx) = broadcast::channel::<RelayEvent>(512);
    let (commands, command_rx) = mpsc::channel::<RelayCommand>(512);

    tokio::spawn(run_hub(MatchHub::new(events.clone()), command_rx));

    info!("score relay listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let commands = commands.clone();
        let rx = events.subscribe();
        tokio::spawn(async move {
            debug!("client {peer} connected");
            if let Err(e) = handle_client(stream, commands, rx).await {
                warn!("client {peer} disconnected: {e}");
            }
        });
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Single consumer of client commands, so per-match ordering follows arrival order.
async fn run_hub(mut hub: MatchHub, mut commands: mpsc::Receiver<RelayCommand>) {
    while let Some(command) = commands.recv().await {
        debug!("{} <- {:?}", command.match_id(), command);
        hub.dispatch(command).await;
    }
}

async fn handle_client(
    stream: TcpStream,
    commands: mpsc::Sender<RelayCommand>,
    mut rx: broadcast::Receiver<RelayEvent>,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<RelayCommand>(&text) {
                            Ok(command) => commands.send(command).await?,
                            Err(e) => {
                                let event = RelayEvent::Error {
                                    match_id: String::new(),
                                    message: format!("bad command: {e}"),
                                };
                                write.send(Message::Text(serde_json::to_string(&event)?.into())).await?;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(event) => {
                        let text = serde_json::to_string(&event)?;
                        write.send(Message::Text(text.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("client lagged, {skipped} events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

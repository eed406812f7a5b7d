mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::keys::send_dispatch;
use crate::state::app_settings::{AppSettings, CliAction, parse_args};
use crate::state::live::{LiveEvent, LiveWorker};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use padel_core::relay::RelayCommand;
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(settings) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    // Loads the match file, so it runs after the logger is up.
    let app = Arc::new(Mutex::new(App::new(settings)?));

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (live_cmd_tx, live_cmd_rx) = mpsc::channel::<RelayCommand>(100);
    let (live_evt_tx, live_evt_rx) = mpsc::channel::<LiveEvent>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Relay thread, only when a relay is configured
    let relay_endpoint = app.lock().await.state.live.endpoint.clone();
    let live_task = relay_endpoint.map(|url| {
        tokio::spawn(
            LiveWorker {
                url,
                commands: live_cmd_rx,
                events: live_evt_tx,
            }
            .run(),
        )
    });

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(
        terminal,
        app,
        ui_event_rx,
        network_req_tx,
        network_resp_rx,
        live_cmd_tx,
        live_evt_rx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    if let Some(task) = live_task {
        task.abort();
    }

    Ok(())
}

/// None when the process should exit right away (help, version).
fn handle_cli_args() -> Option<AppSettings> {
    match parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(options)) => Some(AppSettings::load(options)),
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(CliAction::Version) => {
            println!("padelflow {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "padelflow - padel game analyzer

Usage:
  padelflow [--match <id>] [--team1 <name>] [--team2 <name>]
            [--sets <n>] [--games <n>] [--golden-point] [--no-tiebreak]
  padelflow --help
  padelflow --version

Options:
  -m, --match <id>   Match to score (default: PADELFLOW_MATCH_ID or \"local\")
  --team1 <name>     Name shown for team 1
  --team2 <name>     Name shown for team 2
  --sets <n>         Sets needed to win (default 2)
  --games <n>        Games per set (default 6)
  --golden-point     Decide deuce with a single point
  --no-tiebreak      Play sets out without a tie-break

Environment:
  PADELFLOW_API_URL  Match backend base URL (scores stay local when unset)
  PADELFLOW_API_KEY  Backend API key
  PADELFLOW_RELAY_WS Score relay URL, e.g. ws://127.0.0.1:8788
  PADELFLOW_LOG      Log level for the log pane (default error)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    live_commands: mpsc::Sender<RelayCommand>,
    mut live_events: mpsc::Receiver<LiveEvent>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests, &live_commands).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &live_commands, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(live_event) = live_events.recv() => {
                let should_redraw = handle_live_event(live_event, &app, &network_requests, &live_commands).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    live_commands: &mpsc::Sender<RelayCommand>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let dispatch = app.lock().await.on_started();
            send_dispatch(dispatch, network_requests, live_commands).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests, live_commands).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_live_event(
    event: LiveEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    live_commands: &mpsc::Sender<RelayCommand>,
) -> bool {
    let mut guard = app.lock().await;
    match event {
        LiveEvent::Connected => {
            let dispatch = guard.on_live_connected();
            drop(guard);
            send_dispatch(dispatch, network_requests, live_commands).await;
        }
        LiveEvent::Disconnected => guard.on_live_disconnected(),
        LiveEvent::Relay(event) => guard.on_live_event(event),
        LiveEvent::Error(message) => guard.on_live_error(message),
    }
    true
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    live_commands: &mpsc::Sender<RelayCommand>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::MatchLoaded { record } => {
            let dispatch = app.lock().await.on_match_loaded(record);
            send_dispatch(dispatch, network_requests, live_commands).await;
        }
        NetworkResponse::ScoreSaved { match_id } => {
            app.lock().await.on_score_saved(match_id);
        }
        NetworkResponse::PointActionsLoaded { actions } => {
            app.lock().await.on_point_actions_loaded(actions);
        }
        NetworkResponse::Offline => {
            app.lock().await.on_offline();
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            app.lock().await.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

/// Best effort: also runs from the panic hook, where nothing can be reported.
pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

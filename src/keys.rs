use crate::app::{App, Dispatch, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use padel_core::TeamId;
use padel_core::relay::RelayCommand;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    live_commands: &mpsc::Sender<RelayCommand>,
) {
    let mut guard = app.lock().await;

    let dispatch = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            let dispatch = guard.on_quit();
            drop(guard);
            send_dispatch(dispatch, network_requests, live_commands).await;
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => {
            guard.update_tab(MenuItem::Score);
            None
        }
        (_, Char('2'), _) => {
            guard.update_tab(MenuItem::Points);
            None
        }
        (_, Char('3'), _) => {
            guard.update_tab(MenuItem::Stats);
            None
        }
        (_, Char('4'), _) => {
            guard.update_tab(MenuItem::Live);
            None
        }
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
            None
        }
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // Scoring
        (_, Char('a') | KeyCode::Left, _) => Some(guard.score_point(TeamId::Team1)),
        (_, Char('d') | KeyCode::Right, _) => Some(guard.score_point(TeamId::Team2)),
        (_, Char('u'), _) => Some(guard.undo()),
        (_, Char('s'), _) => Some(guard.save_now()),

        // Point action for the next point
        (_, Char('j') | KeyCode::Down, _) => {
            guard.select_next_action();
            None
        }
        (_, Char('k') | KeyCode::Up, _) => {
            guard.select_prev_action();
            None
        }
        (_, KeyCode::Esc, _) => {
            guard.clear_action();
            None
        }

        // Global
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    drop(guard);
    if let Some(dispatch) = dispatch {
        send_dispatch(dispatch, network_requests, live_commands).await;
    }
}

pub async fn send_dispatch(
    dispatch: Dispatch,
    network_requests: &mpsc::Sender<NetworkRequest>,
    live_commands: &mpsc::Sender<RelayCommand>,
) {
    for request in dispatch.network {
        let _ = network_requests.send(request).await;
    }
    // Closed when no relay is configured.
    for command in dispatch.live {
        let _ = live_commands.send(command).await;
    }
}

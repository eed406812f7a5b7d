use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, BackendStatus, MatchFile, MatchSource, MatchState};
use crate::state::messages::NetworkRequest;
use chrono::Local;
use log::{debug, info, warn};
use padel_core::client::load_embedded_point_actions;
use padel_core::relay::{RelayCommand, RelayEvent};
use padel_core::{MatchRecord, Pair, PointAction, TeamId};
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Score,
    Points,
    Stats,
    Live,
    Help,
}

/// Requests produced by a state change, sent by the caller once the app lock
/// is released.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub network: Vec<NetworkRequest>,
    pub live: Vec<RelayCommand>,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    match_path: PathBuf,
}

impl App {
    pub fn new(settings: AppSettings) -> anyhow::Result<Self> {
        let match_path = match_file_path(&settings.match_id());
        Self::with_match_path(settings, match_path)
    }

    pub fn with_match_path(settings: AppSettings, match_path: PathBuf) -> anyhow::Result<Self> {
        let game = initial_match(&settings, &match_path)?;

        let mut app = Self {
            state: AppState::new(game),
            settings,
            match_path,
        };

        match load_embedded_point_actions() {
            Ok(actions) => app.state.picker.load(actions),
            Err(e) => warn!("embedded point actions unreadable: {e}"),
        }

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        Ok(app)
    }

    /// Requests to send once the UI is up.
    pub fn on_started(&self) -> Dispatch {
        let mut dispatch = Dispatch::default();
        dispatch.network.push(NetworkRequest::LoadPointActions);
        if self.state.game.source == MatchSource::New {
            dispatch.network.push(NetworkRequest::LoadMatch {
                match_id: self.state.game.match_id.clone(),
            });
        }
        dispatch
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    pub fn score_point(&mut self, team: TeamId) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let action = self.state.picker.take();

        let outcome = match self.state.game.score_point(team, action) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.on_error(e.to_string());
                return dispatch;
            }
        };
        self.state.last_error = None;
        debug!(
            "point {}: {}",
            self.state.game.team_name(team),
            self.state.game.engine.formatted_score()
        );

        dispatch.live.push(RelayCommand::Point {
            match_id: self.state.game.match_id.clone(),
            team,
        });

        if let Some(winner) = outcome.match_won {
            info!("match won by {}", self.state.game.team_name(winner));
        }
        if outcome.game_won.is_some() {
            self.persist(&mut dispatch);
        }
        dispatch
    }

    pub fn undo(&mut self) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let was_finished = self.state.game.engine.is_match_finished();
        let Some(record) = self.state.game.undo() else {
            self.on_error("nothing to undo".to_string());
            return dispatch;
        };
        self.state.last_error = None;
        debug!("undid point for {}", record.team);

        // The relay closes a court once its match is decided, so reopen it.
        if was_finished {
            dispatch.live.push(self.state.game.open_command());
        } else {
            dispatch.live.push(RelayCommand::Undo {
                match_id: self.state.game.match_id.clone(),
            });
        }
        self.persist(&mut dispatch);
        dispatch
    }

    pub fn save_now(&mut self) -> Dispatch {
        let mut dispatch = Dispatch::default();
        self.persist(&mut dispatch);
        dispatch
    }

    /// Saves points scored since the last game boundary. An untouched new
    /// match is not written, so the next start still asks the backend for it.
    pub fn on_quit(&mut self) -> Dispatch {
        let game = &self.state.game;
        if game.source == MatchSource::New && game.records.is_empty() {
            return Dispatch::default();
        }
        self.save_now()
    }

    fn persist(&mut self, dispatch: &mut Dispatch) {
        match write_match_file(&self.match_path, &self.state.game.to_file()) {
            Ok(()) => {
                self.state.last_saved_at = Some(Local::now().format("%H:%M:%S").to_string());
            }
            Err(e) => self.on_error(e),
        }
        if self.state.backend != BackendStatus::Offline {
            dispatch.network.push(NetworkRequest::SaveScore {
                match_id: self.state.game.match_id.clone(),
                update: self.state.game.score_update(),
            });
        }
    }

    pub fn select_next_action(&mut self) {
        self.state.picker.next();
    }

    pub fn select_prev_action(&mut self) {
        self.state.picker.prev();
    }

    pub fn clear_action(&mut self) {
        self.state.picker.clear();
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_match_loaded(&mut self, record: Option<MatchRecord>) -> Dispatch {
        self.state.backend = BackendStatus::Online;
        let mut dispatch = Dispatch::default();

        let Some(record) = record else {
            info!("match {} not on the backend, scoring it fresh", self.state.game.match_id);
            return dispatch;
        };
        if self.state.game.source != MatchSource::New || !self.state.game.records.is_empty() {
            warn!("ignoring backend score for {}: local points already recorded", record.id);
            return dispatch;
        }

        let mut game = match MatchState::from_record(&record) {
            Ok(game) => game,
            Err(e) => {
                self.on_error(format!("backend match {} unusable: {e}", record.id));
                return dispatch;
            }
        };
        apply_team_overrides(&mut game.teams, &self.settings);
        info!("restored {}: {}", record.id, game.engine.formatted_score());
        self.state.game = game;

        if self.state.live.is_enabled() {
            dispatch.live.push(self.state.game.open_command());
        }
        dispatch
    }

    pub fn on_point_actions_loaded(&mut self, actions: Vec<PointAction>) {
        debug!("{} point actions loaded", actions.len());
        self.state.picker.load(actions);
    }

    pub fn on_score_saved(&mut self, match_id: String) {
        self.state.backend = BackendStatus::Online;
        debug!("backend score saved for {match_id}");
    }

    pub fn on_offline(&mut self) {
        self.state.backend = BackendStatus::Offline;
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Score relay
    // -----------------------------------------------------------------------

    pub fn on_live_connected(&mut self) -> Dispatch {
        self.state.live.connected = true;
        let endpoint = self.state.live.endpoint.clone().unwrap_or_default();
        self.state.live.push_message(format!("connected to {endpoint}"));
        Dispatch {
            live: vec![self.state.game.open_command()],
            ..Dispatch::default()
        }
    }

    pub fn on_live_disconnected(&mut self) {
        if self.state.live.connected {
            self.state.live.push_message("relay disconnected, retrying...");
        }
        self.state.live.connected = false;
    }

    pub fn on_live_error(&mut self, message: String) {
        self.state.live.push_message(message);
    }

    pub fn on_live_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Score(score) => self.state.live.update_court(score),
            RelayEvent::Error { match_id, message } => {
                if match_id == self.state.game.match_id {
                    warn!("relay rejected update: {message}");
                }
                self.state.live.push_message(format!("{match_id}: {message}"));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn match_path(&self) -> &Path {
        &self.match_path
    }
}

/// Match file first, then a fresh match from the command line. The backend
/// record, if any, arrives later through `on_match_loaded`.
fn initial_match(settings: &AppSettings, match_path: &Path) -> anyhow::Result<MatchState> {
    let match_id = settings.match_id();
    let cli_config = settings.options.game_config();

    match read_match_file(match_path) {
        Ok(file) => {
            if file.match_id != match_id {
                anyhow::bail!(
                    "{} belongs to match {:?}, not {match_id:?}",
                    match_path.display(),
                    file.match_id
                );
            }
            if cli_config.is_some_and(|config| config != file.config) {
                warn!("{} has its own format, ignoring format flags", match_path.display());
            }
            let mut game = MatchState::from_file(file)?;
            apply_team_overrides(&mut game.teams, settings);
            info!("resumed {match_id} with {} points", game.records.len());
            return Ok(game);
        }
        Err(e) if match_path.exists() => warn!("{e}"),
        Err(_) => {}
    }

    let mut teams = Pair::new("Team 1".to_string(), "Team 2".to_string());
    apply_team_overrides(&mut teams, settings);
    Ok(MatchState::new(match_id, teams, cli_config.unwrap_or_default())?)
}

fn apply_team_overrides(teams: &mut Pair<String>, settings: &AppSettings) {
    if let Some(name) = &settings.options.team1 {
        teams.team1 = name.clone();
    }
    if let Some(name) = &settings.options.team2 {
        teams.team2 = name.clone();
    }
}

pub fn match_file_path(match_id: &str) -> PathBuf {
    let file_name = format!("match_{}.json", file_safe(match_id));
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("padelflow").join(file_name);
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("padelflow")
            .join(file_name);
    }
    PathBuf::from(file_name)
}

/// Escapes every byte outside `[A-Za-z0-9-]` as `_xx`, so distinct ids never
/// share a file.
fn file_safe(match_id: &str) -> String {
    let mut out = String::with_capacity(match_id.len());
    for byte in match_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

pub fn write_match_file(path: &Path, file: &MatchFile) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
    }
    let payload =
        serde_json::to_string_pretty(file).map_err(|e| format!("serialize match failed: {e}"))?;
    std::fs::write(path, payload).map_err(|e| format!("write match failed: {e}"))?;
    Ok(())
}

pub fn read_match_file(path: &Path) -> Result<MatchFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: read failed: {e}", path.display()))?;
    serde_json::from_str::<MatchFile>(&content)
        .map_err(|e| format!("{}: invalid match json: {e}", path.display()))
}

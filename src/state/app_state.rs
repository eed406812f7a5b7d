use crate::app::MenuItem;
use chrono::{DateTime, Local, Utc};
use padel_core::relay::{LiveScore, RelayCommand};
use padel_core::stats::{MatchStats, PointRecord, point_sequence};
use padel_core::{
    GameConfig, MatchRecord, MatchStatus, PadelScoreManager, Pair, PointAction, PointOutcome,
    ScoreError, ScoreSnapshot, ScoreUpdate, TeamId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Match file
// ---------------------------------------------------------------------------

/// On-disk form of an analyzed match. The engine is rebuilt by replaying
/// `records` on top of `base`; `snapshot` is the score at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFile {
    pub match_id: String,
    pub team1: String,
    pub team2: String,
    pub config: GameConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<ScoreSnapshot>,
    pub snapshot: ScoreSnapshot,
    #[serde(default)]
    pub records: Vec<PointRecord>,
    pub saved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Match state
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MatchSource {
    #[default]
    New,
    File,
    Backend,
}

impl MatchSource {
    pub fn label(self) -> &'static str {
        match self {
            MatchSource::New => "new match",
            MatchSource::File => "resumed from file",
            MatchSource::Backend => "restored from backend",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub match_id: String,
    pub teams: Pair<String>,
    pub engine: PadelScoreManager,
    /// Score the point log starts from (a restored snapshot), None for 0-0.
    pub base: Option<ScoreSnapshot>,
    pub records: Vec<PointRecord>,
    pub source: MatchSource,
    pub last_outcome: PointOutcome,
}

impl MatchState {
    pub fn new(match_id: String, teams: Pair<String>, config: GameConfig) -> Result<Self, ScoreError> {
        Ok(Self {
            match_id,
            teams,
            engine: PadelScoreManager::new(config)?,
            base: None,
            records: Vec::new(),
            source: MatchSource::New,
            last_outcome: PointOutcome::default(),
        })
    }

    /// Rebuild from a match file. Records the engine rejects (points logged
    /// after the match ended) are dropped.
    pub fn from_file(file: MatchFile) -> Result<Self, ScoreError> {
        let mut state = Self::new(
            file.match_id,
            Pair::new(file.team1, file.team2),
            file.config,
        )?;
        if let Some(base) = &file.base {
            state.engine.restore_score(base);
            state.base = Some(*base);
        }
        for record in file.records {
            if state.engine.add_point(record.team).is_err() {
                break;
            }
            state.records.push(record);
        }
        state.source = MatchSource::File;
        Ok(state)
    }

    /// Start from a backend record, resuming its persisted score if any.
    pub fn from_record(record: &MatchRecord) -> Result<Self, ScoreError> {
        let mut state = Self::new(
            record.id.clone(),
            Pair::new(record.team1.clone(), record.team2.clone()),
            record.config,
        )?;
        if let Some(snapshot) = &record.snapshot {
            state.engine.restore_score(snapshot);
            state.base = Some(*snapshot);
        }
        state.source = MatchSource::Backend;
        Ok(state)
    }

    pub fn to_file(&self) -> MatchFile {
        MatchFile {
            match_id: self.match_id.clone(),
            team1: self.teams.team1.clone(),
            team2: self.teams.team2.clone(),
            config: *self.engine.config(),
            base: self.base,
            snapshot: self.engine.snapshot(),
            records: self.records.clone(),
            saved_at: Utc::now(),
        }
    }

    pub fn score_point(
        &mut self,
        team: TeamId,
        action: Option<String>,
    ) -> Result<PointOutcome, ScoreError> {
        let outcome = self.engine.add_point(team)?;
        self.records.push(PointRecord::new(team, action));
        self.last_outcome = outcome;
        Ok(outcome)
    }

    pub fn undo(&mut self) -> Option<PointRecord> {
        self.engine.undo_last_point()?;
        self.last_outcome = PointOutcome::default();
        self.records.pop()
    }

    pub fn team_name(&self, team: TeamId) -> &str {
        let name = &self.teams[team];
        if name.trim().is_empty() { team.label() } else { name.as_str() }
    }

    pub fn status(&self) -> MatchStatus {
        if self.engine.is_match_finished() {
            MatchStatus::Finished
        } else if self.records.is_empty() && self.base.is_none() {
            MatchStatus::Scheduled
        } else {
            MatchStatus::InProgress
        }
    }

    pub fn score_update(&self) -> ScoreUpdate {
        ScoreUpdate::from_manager(&self.engine)
    }

    pub fn stats(&self) -> MatchStats {
        MatchStats::compute(*self.engine.config(), self.base.as_ref(), &self.records)
            .unwrap_or_default()
    }

    /// Full state for the relay, used on (re)connect.
    pub fn open_command(&self) -> RelayCommand {
        RelayCommand::Open {
            match_id: self.match_id.clone(),
            team1: self.teams.team1.clone(),
            team2: self.teams.team2.clone(),
            config: *self.engine.config(),
            snapshot: self.base,
            points: point_sequence(&self.records),
        }
    }

    /// Point-by-point log with the score after each point, newest last.
    pub fn point_log(&self, actions: &[PointAction]) -> Vec<PointLogEntry> {
        let Ok(mut replay) = PadelScoreManager::new(*self.engine.config()) else {
            return Vec::new();
        };
        if let Some(base) = &self.base {
            replay.restore_score(base);
        }

        let mut entries = Vec::with_capacity(self.records.len());
        for (idx, record) in self.records.iter().enumerate() {
            let Ok(outcome) = replay.add_point(record.team) else {
                break;
            };
            let action = record.action.as_deref().map(|code| {
                actions
                    .iter()
                    .find(|a| a.code == code)
                    .map(|a| a.label.clone())
                    .unwrap_or_else(|| code.to_string())
            });
            entries.push(PointLogEntry {
                number: idx + 1,
                time: record
                    .recorded_at
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string(),
                team: record.team,
                action,
                score: replay.formatted_score(),
                game_score: replay.current_game_score(),
                outcome,
            });
        }
        entries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLogEntry {
    pub number: usize,
    pub time: String,
    pub team: TeamId,
    pub action: Option<String>,
    pub score: String,
    pub game_score: String,
    pub outcome: PointOutcome,
}

// ---------------------------------------------------------------------------
// Point-action picker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ActionPicker {
    pub actions: Vec<PointAction>,
    pub selected: Option<usize>,
}

impl ActionPicker {
    pub fn load(&mut self, actions: Vec<PointAction>) {
        let previous = self.selected_code().map(str::to_owned);
        self.actions = actions;
        self.selected = previous.and_then(|code| self.actions.iter().position(|a| a.code == code));
    }

    pub fn next(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(idx) => (idx + 1) % self.actions.len(),
            None => 0,
        });
    }

    pub fn prev(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        let last = self.actions.len() - 1;
        self.selected = Some(match self.selected {
            Some(0) | None => last,
            Some(idx) => idx - 1,
        });
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected_action(&self) -> Option<&PointAction> {
        self.actions.get(self.selected?)
    }

    pub fn selected_code(&self) -> Option<&str> {
        self.selected_action().map(|a| a.code.as_str())
    }

    /// Consume the selection for the point being scored.
    pub fn take(&mut self) -> Option<String> {
        let code = self.selected_code().map(str::to_owned);
        self.selected = None;
        code
    }
}

// ---------------------------------------------------------------------------
// Live courts (score relay)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LiveState {
    pub endpoint: Option<String>,
    pub connected: bool,
    pub courts: BTreeMap<String, LiveScore>,
    pub messages: Vec<LiveMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveMessage {
    pub time: String,
    pub body: String,
}

impl LiveState {
    const MAX_MESSAGES: usize = 50;

    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("PADELFLOW_RELAY_WS")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn update_court(&mut self, score: LiveScore) {
        self.courts.insert(score.match_id.clone(), score);
    }

    pub fn push_message(&mut self, body: impl Into<String>) {
        let body = body.into();
        if self.messages.last().is_some_and(|last| last.body == body) {
            return;
        }
        self.messages.push(LiveMessage {
            time: Local::now().format("%H:%M").to_string(),
            body,
        });
        if self.messages.len() > Self::MAX_MESSAGES {
            let remove_count = self.messages.len() - Self::MAX_MESSAGES;
            self.messages.drain(0..remove_count);
        }
    }
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Offline,
    Online,
}

pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub backend: BackendStatus,
    pub last_saved_at: Option<String>,
    pub game: MatchState,
    pub picker: ActionPicker,
    pub live: LiveState,
}

impl AppState {
    pub fn new(game: MatchState) -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            last_error: None,
            backend: BackendStatus::default(),
            last_saved_at: None,
            game,
            picker: ActionPicker::default(),
            live: LiveState::from_env(),
        }
    }
}

//! Live scoring relay: wire protocol and the per-match hub.
//!
//! A scoring engine assumes serialized access, so every match gets its own
//! task that owns the engine and drains a bounded command queue. The hub only
//! routes commands by match id; all score events go out on one broadcast
//! channel. A court task ends once its match is decided or after sitting idle,
//! and the hub forgets it on the next command.

use crate::{
    GameConfig, GamePoint, MatchPhase, PadelScoreManager, Pair, PointOutcome, ScoreError,
    ScoreSnapshot, TeamId,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

pub const MATCH_QUEUE_DEPTH: usize = 64;

/// How long a court may go without commands before its task ends.
pub const COURT_IDLE_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayCommand {
    /// Create the match, or reset it if it already exists. `points` are
    /// replayed on top of `snapshot` (or a fresh match).
    Open {
        match_id: String,
        #[serde(default)]
        team1: String,
        #[serde(default)]
        team2: String,
        #[serde(default)]
        config: GameConfig,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snapshot: Option<ScoreSnapshot>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        points: Vec<TeamId>,
    },
    Point {
        match_id: String,
        team: TeamId,
    },
    Undo {
        match_id: String,
    },
}

impl RelayCommand {
    pub fn match_id(&self) -> &str {
        match self {
            RelayCommand::Open { match_id, .. }
            | RelayCommand::Point { match_id, .. }
            | RelayCommand::Undo { match_id } => match_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    Score(LiveScore),
    Error { match_id: String, message: String },
}

/// Score of one court as broadcast after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveScore {
    pub match_id: String,
    pub team1: String,
    pub team2: String,
    pub snapshot: ScoreSnapshot,
    pub game_points: Pair<GamePoint>,
    pub formatted: String,
    pub game_score: String,
    pub phase: MatchPhase,
    #[serde(default)]
    pub outcome: PointOutcome,
    #[serde(default)]
    pub winner: Option<TeamId>,
}

#[derive(Debug)]
struct Court {
    team1: String,
    team2: String,
    engine: PadelScoreManager,
}

impl Court {
    fn live_score(&self, match_id: &str, outcome: PointOutcome) -> LiveScore {
        LiveScore {
            match_id: match_id.to_owned(),
            team1: self.team1.clone(),
            team2: self.team2.clone(),
            snapshot: self.engine.snapshot(),
            game_points: self.engine.score().game_points,
            formatted: self.engine.formatted_score(),
            game_score: self.engine.current_game_score(),
            phase: self.engine.phase(),
            outcome,
            winner: self.engine.match_winner(),
        }
    }
}

#[derive(Debug)]
enum CourtCommand {
    Reset(Court),
    Point(TeamId),
    Undo,
}

/// Routes relay commands to one serialized task per match.
#[derive(Debug)]
pub struct MatchHub {
    courts: HashMap<String, mpsc::Sender<CourtCommand>>,
    events: broadcast::Sender<RelayEvent>,
    idle_timeout: Duration,
}

impl MatchHub {
    pub fn new(events: broadcast::Sender<RelayEvent>) -> Self {
        Self {
            courts: HashMap::new(),
            events,
            idle_timeout: COURT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Courts whose task is still running.
    pub fn open_matches(&self) -> usize {
        self.courts.values().filter(|tx| !tx.is_closed()).count()
    }

    pub async fn dispatch(&mut self, command: RelayCommand) {
        self.courts.retain(|_, tx| !tx.is_closed());
        match command {
            RelayCommand::Open {
                match_id,
                team1,
                team2,
                config,
                snapshot,
                points,
            } => {
                let engine = match build_engine(config, snapshot.as_ref(), &points) {
                    Ok(engine) => engine,
                    Err(e) => {
                        self.error(&match_id, e.to_string());
                        return;
                    }
                };
                let court = Court { team1, team2, engine };
                self.open(match_id, court).await;
            }
            RelayCommand::Point { match_id, team } => {
                self.forward(&match_id, CourtCommand::Point(team)).await;
            }
            RelayCommand::Undo { match_id } => {
                self.forward(&match_id, CourtCommand::Undo).await;
            }
        }
    }

    async fn open(&mut self, match_id: String, court: Court) {
        if let Some(tx) = self.courts.get(&match_id) {
            match tx.send(CourtCommand::Reset(court)).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(CourtCommand::Reset(court))) => {
                    warn!("court task for {match_id} ended, restarting");
                    self.spawn(match_id, court);
                }
                Err(_) => {}
            }
            return;
        }
        self.spawn(match_id, court);
    }

    fn spawn(&mut self, match_id: String, court: Court) {
        debug!("opening court {match_id}");
        let (tx, rx) = mpsc::channel(MATCH_QUEUE_DEPTH);
        tokio::spawn(run_court(
            match_id.clone(),
            court,
            rx,
            self.events.clone(),
            self.idle_timeout,
        ));
        self.courts.insert(match_id, tx);
    }

    async fn forward(&mut self, match_id: &str, command: CourtCommand) {
        let Some(tx) = self.courts.get(match_id) else {
            self.error(match_id, format!("unknown match {match_id}"));
            return;
        };
        if tx.send(command).await.is_err() {
            self.courts.remove(match_id);
            self.error(match_id, format!("match {match_id} is no longer open"));
        }
    }

    fn error(&self, match_id: &str, message: String) {
        warn!("{match_id}: {message}");
        let _ = self.events.send(RelayEvent::Error {
            match_id: match_id.to_owned(),
            message,
        });
    }
}

fn build_engine(
    config: GameConfig,
    snapshot: Option<&ScoreSnapshot>,
    points: &[TeamId],
) -> Result<PadelScoreManager, ScoreError> {
    let mut engine = PadelScoreManager::new(config)?;
    if let Some(snapshot) = snapshot {
        engine.restore_score(snapshot);
    }
    for &team in points {
        engine.add_point(team)?;
    }
    Ok(engine)
}

async fn run_court(
    match_id: String,
    mut court: Court,
    mut commands: mpsc::Receiver<CourtCommand>,
    events: broadcast::Sender<RelayEvent>,
    idle_timeout: Duration,
) {
    let _ = events.send(RelayEvent::Score(court.live_score(&match_id, PointOutcome::default())));

    loop {
        // A decided match takes no new commands; whatever is already queued
        // is still answered before the task ends.
        if court.engine.is_match_finished() {
            commands.close();
        }
        let command = match tokio::time::timeout(idle_timeout, commands.recv()).await {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(_) => {
                debug!("court {match_id} idle, closing");
                break;
            }
        };
        let result = match command {
            CourtCommand::Reset(next) => {
                court = next;
                Ok(PointOutcome::default())
            }
            CourtCommand::Point(team) => court.engine.add_point(team).map_err(|e| e.to_string()),
            CourtCommand::Undo => match court.engine.undo_last_point() {
                Some(_) => Ok(PointOutcome::default()),
                None => Err("nothing to undo".to_string()),
            },
        };

        let event = match result {
            Ok(outcome) => RelayEvent::Score(court.live_score(&match_id, outcome)),
            Err(message) => RelayEvent::Error {
                match_id: match_id.clone(),
                message,
            },
        };
        let _ = events.send(event);
    }
    debug!("court {match_id} closed");
}

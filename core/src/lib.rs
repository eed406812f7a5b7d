pub mod client;
pub mod manager;
pub mod relay;
pub mod rows;
pub mod stats;

pub use manager::PadelScoreManager;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamId {
    Team1,
    Team2,
}

impl TeamId {
    pub const BOTH: [TeamId; 2] = [TeamId::Team1, TeamId::Team2];

    pub fn opponent(self) -> Self {
        match self {
            TeamId::Team1 => TeamId::Team2,
            TeamId::Team2 => TeamId::Team1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TeamId::Team1 => "team1",
            TeamId::Team2 => "team2",
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per team. Serialises as `[team1, team2]`, the shape persisted
/// match records use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pair<T> {
    pub team1: T,
    pub team2: T,
}

impl<T> Pair<T> {
    pub const fn new(team1: T, team2: T) -> Self {
        Self { team1, team2 }
    }
}

impl<T: Copy> Pair<T> {
    pub fn splat(value: T) -> Self {
        Self { team1: value, team2: value }
    }
}

impl<T> Index<TeamId> for Pair<T> {
    type Output = T;

    fn index(&self, team: TeamId) -> &T {
        match team {
            TeamId::Team1 => &self.team1,
            TeamId::Team2 => &self.team2,
        }
    }
}

impl<T> IndexMut<TeamId> for Pair<T> {
    fn index_mut(&mut self, team: TeamId) -> &mut T {
        match team {
            TeamId::Team1 => &mut self.team1,
            TeamId::Team2 => &mut self.team2,
        }
    }
}

impl<T: Serialize> Serialize for Pair<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.team1, &self.team2).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Pair<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (team1, team2) = <(T, T)>::deserialize(deserializer)?;
        Ok(Pair { team1, team2 })
    }
}

// ---------------------------------------------------------------------------
// Point score within a game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GamePoint {
    #[default]
    Love,
    Fifteen,
    Thirty,
    Forty,
    Advantage,
}

impl GamePoint {
    /// Regular progression up to forty. Forty and advantage have no plain
    /// successor: what happens next depends on the opponent and the scoring rule.
    pub fn next(self) -> Option<Self> {
        match self {
            GamePoint::Love => Some(GamePoint::Fifteen),
            GamePoint::Fifteen => Some(GamePoint::Thirty),
            GamePoint::Thirty => Some(GamePoint::Forty),
            GamePoint::Forty | GamePoint::Advantage => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GamePoint::Love => "0",
            GamePoint::Fifteen => "15",
            GamePoint::Thirty => "30",
            GamePoint::Forty => "40",
            GamePoint::Advantage => "AD",
        }
    }
}

impl fmt::Display for GamePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GamePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GamePoint::Love => serializer.serialize_u8(0),
            GamePoint::Fifteen => serializer.serialize_u8(15),
            GamePoint::Thirty => serializer.serialize_u8(30),
            GamePoint::Forty => serializer.serialize_u8(40),
            GamePoint::Advantage => serializer.serialize_str("AD"),
        }
    }
}

impl<'de> Deserialize<'de> for GamePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPoint {
            Number(u8),
            Text(String),
        }

        match RawPoint::deserialize(deserializer)? {
            RawPoint::Number(0) => Ok(GamePoint::Love),
            RawPoint::Number(15) => Ok(GamePoint::Fifteen),
            RawPoint::Number(30) => Ok(GamePoint::Thirty),
            RawPoint::Number(40) => Ok(GamePoint::Forty),
            RawPoint::Text(s) if s == "AD" => Ok(GamePoint::Advantage),
            RawPoint::Number(n) => Err(serde::de::Error::custom(format!("invalid game point {n}"))),
            RawPoint::Text(s) => Err(serde::de::Error::custom(format!("invalid game point {s:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Match configuration
// ---------------------------------------------------------------------------

/// Upper bound accepted for `sets_to_win` and `games_per_set`.
pub const MAX_FORMAT_COUNT: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub sets_to_win: u32,
    /// 9 also enables the pro-set tie-break at 8-8.
    pub games_per_set: u32,
    /// Golden point: 40-40 is decided by the next point.
    pub no_advantage: bool,
    pub tie_break_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::best_of_three()
    }
}

impl GameConfig {
    pub fn best_of_three() -> Self {
        Self {
            sets_to_win: 2,
            games_per_set: 6,
            no_advantage: false,
            tie_break_enabled: true,
        }
    }

    pub fn best_of_three_golden_point() -> Self {
        Self {
            no_advantage: true,
            ..Self::best_of_three()
        }
    }

    /// Single set to 9 games, tie-break at 8-8.
    pub fn pro_set() -> Self {
        Self {
            sets_to_win: 1,
            games_per_set: 9,
            no_advantage: false,
            tie_break_enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if !(1..=MAX_FORMAT_COUNT).contains(&self.sets_to_win) {
            return Err(ScoreError::InvalidConfig(format!(
                "sets_to_win must be between 1 and {MAX_FORMAT_COUNT}"
            )));
        }
        if !(1..=MAX_FORMAT_COUNT).contains(&self.games_per_set) {
            return Err(ScoreError::InvalidConfig(format!(
                "games_per_set must be between 1 and {MAX_FORMAT_COUNT}"
            )));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let sets = self.sets_to_win.saturating_mul(2).saturating_sub(1);
        let scoring = if self.no_advantage { "golden point" } else { "advantage" };
        let tie_break = if self.tie_break_enabled { "tie-break" } else { "no tie-break" };
        format!("best of {sets}, {} games, {scoring}, {tie_break}", self.games_per_set)
    }
}

// ---------------------------------------------------------------------------
// Score state
// ---------------------------------------------------------------------------

/// Full scoring state for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadelScore {
    /// Sets won by each team.
    pub sets: Pair<u32>,
    /// 1-based index of the set in progress.
    pub current_set: u32,
    /// Games won by each team in the current set.
    pub current_game: Pair<u32>,
    pub tie_break: bool,
    pub tie_break_score: Pair<u32>,
    pub game_points: Pair<GamePoint>,
}

impl Default for PadelScore {
    fn default() -> Self {
        Self {
            sets: Pair::default(),
            current_set: 1,
            current_game: Pair::default(),
            tie_break: false,
            tie_break_score: Pair::default(),
            game_points: Pair::default(),
        }
    }
}

impl PadelScore {
    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            sets: self.sets,
            current_set: self.current_set,
            current_game: self.current_game,
            tie_break: self.tie_break,
            tie_break_score: Some(self.tie_break_score),
        }
    }
}

/// Persisted score shape. Carries no in-game point granularity: callers save
/// at game boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub sets: Pair<u32>,
    pub current_set: u32,
    pub current_game: Pair<u32>,
    pub tie_break: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break_score: Option<Pair<u32>>,
}

impl Default for ScoreSnapshot {
    fn default() -> Self {
        PadelScore::default().snapshot()
    }
}

/// Boundaries crossed by a single point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_won: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_won: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_won: Option<TeamId>,
}

impl PointOutcome {
    pub fn is_empty(&self) -> bool {
        self.game_won.is_none() && self.set_won.is_none() && self.match_won.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    InGame,
    InTieBreak,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    InvalidConfig(String),
    /// A point was offered after a team already reached `sets_to_win`.
    MatchFinished,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::InvalidConfig(msg) => write!(f, "invalid match config: {msg}"),
            ScoreError::MatchFinished => write!(f, "match is already finished"),
        }
    }
}

impl std::error::Error for ScoreError {}

// ---------------------------------------------------------------------------
// Backend records: clean model, independent of the row wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Finished,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRecord {
    pub id: String,
    pub team1: String,
    pub team2: String,
    pub config: GameConfig,
    /// Last persisted score; None before the first point.
    pub snapshot: Option<ScoreSnapshot>,
    pub status: MatchStatus,
    pub winner: Option<TeamId>,
}

/// What gets written back to the match record after a game boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub snapshot: ScoreSnapshot,
    pub status: MatchStatus,
    pub winner: Option<TeamId>,
}

impl ScoreUpdate {
    pub fn from_manager(manager: &PadelScoreManager) -> Self {
        let winner = manager.match_winner();
        let status = if winner.is_some() {
            MatchStatus::Finished
        } else {
            MatchStatus::InProgress
        };
        Self {
            snapshot: manager.snapshot(),
            status,
            winner,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Winner,
    ForcedError,
    UnforcedError,
    #[default]
    Other,
}

impl ActionCategory {
    pub fn label(self) -> &'static str {
        match self {
            ActionCategory::Winner => "Winner",
            ActionCategory::ForcedError => "Forced error",
            ActionCategory::UnforcedError => "Unforced error",
            ActionCategory::Other => "Other",
        }
    }
}

/// Entry of the point-action taxonomy used to tag scored points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAction {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub category: ActionCategory,
}

/// Wire types for the hosted PostgREST backend.
/// Endpoints: {base}/rest/v1/matches, {base}/rest/v1/point_actions
use crate::{ScoreSnapshot, TeamId};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Default, Debug, Clone)]
pub struct MatchRow {
    pub id: String,
    #[serde(default)]
    pub team1_name: Option<String>,
    #[serde(default)]
    pub team2_name: Option<String>,
    /// Format columns are nullable for matches created before scoring was configured.
    #[serde(default)]
    pub sets_to_win: Option<u32>,
    #[serde(default)]
    pub games_per_set: Option<u32>,
    #[serde(default)]
    pub no_advantage: Option<bool>,
    #[serde(default)]
    pub tie_break_enabled: Option<bool>,
    /// JSONB column holding the last persisted snapshot.
    #[serde(default)]
    pub score: Option<ScoreSnapshot>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub winner: Option<String>,
}

/// Body of the PATCH sent after a game boundary.
#[derive(Serialize, Debug)]
pub struct MatchScorePatch<'a> {
    pub score: &'a ScoreSnapshot,
    pub status: &'static str,
    pub winner: Option<TeamId>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct PointActionRow {
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

use crate::rows::{MatchRow, MatchScorePatch, PointActionRow};
use crate::{
    ActionCategory, GameConfig, MatchRecord, MatchStatus, PointAction, ScoreUpdate, TeamId,
};
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const REST_PREFIX: &str = "rest/v1";
const FALLBACK_POINT_ACTIONS_JSON: &str = include_str!("../point_actions.json");

/// Client for the hosted match backend.
#[derive(Debug, Clone)]
pub struct PadelApi {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl Default for PadelApi {
    fn default() -> Self {
        let base_url = std::env::var("PADELFLOW_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let api_key = std::env::var("PADELFLOW_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::build(base_url, api_key)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    NotConfigured,
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::NotConfigured => write!(f, "Backend not configured (set PADELFLOW_API_URL)"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl PadelApi {
    /// Reads `PADELFLOW_API_URL` and `PADELFLOW_API_KEY`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::build(Some(base_url.into()), api_key)
    }

    fn build(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("padelflow/0.1 (terminal game analyzer)")
                .build()
                .unwrap_or_default(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .filter(|url| !url.is_empty()),
            api_key,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch one match record, including its last persisted score.
    pub async fn fetch_match(&self, match_id: &str) -> ApiResult<MatchRecord> {
        let url = format!("{}/matches?id=eq.{}&select=*", self.rest_base()?, checked_id(match_id)?);
        let rows: Vec<MatchRow> = self.get(&url).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("match {match_id}")))?;
        map_match_row(row)
    }

    /// Write the score, status and winner back to the match record.
    pub async fn save_score(&self, match_id: &str, update: &ScoreUpdate) -> ApiResult<()> {
        let url = format!("{}/matches?id=eq.{}", self.rest_base()?, checked_id(match_id)?);
        let body = MatchScorePatch {
            score: &update.snapshot,
            status: update.status.as_str(),
            winner: update.winner,
        };
        let response = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.clone()))?;
        debug!("saved score for match {match_id}");
        Ok(())
    }

    /// Fetch the point-action taxonomy.
    ///
    /// Falls back to the embedded list when the backend is not configured,
    /// unreachable, or returns nothing.
    pub async fn fetch_point_actions(&self) -> ApiResult<Vec<PointAction>> {
        if let Ok(base) = self.rest_base() {
            let url = format!("{base}/point_actions?select=*");
            match self.get::<Vec<PointActionRow>>(&url).await {
                Ok(rows) if !rows.is_empty() => {
                    return Ok(rows.into_iter().map(map_point_action_row).collect());
                }
                Ok(_) => debug!("backend returned no point actions, using embedded list"),
                Err(e) => warn!("point actions unavailable ({e}), using embedded list"),
            }
        }
        load_embedded_point_actions()
    }

    fn rest_base(&self) -> ApiResult<String> {
        let base = self.base_url.as_deref().ok_or(ApiError::NotConfigured)?;
        Ok(format!("{base}/{REST_PREFIX}"))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }
        builder
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_owned())),
            Err(e) => Err(ApiError::Api(e, url.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping: backend rows → clean domain types
// ---------------------------------------------------------------------------

/// Ids go straight into a PostgREST filter, so only plain identifier
/// characters are accepted.
fn checked_id(match_id: &str) -> ApiResult<&str> {
    let valid = !match_id.is_empty()
        && match_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(match_id)
    } else {
        Err(ApiError::Other(format!("invalid match id {match_id:?}")))
    }
}

fn map_match_row(row: MatchRow) -> ApiResult<MatchRecord> {
    let defaults = GameConfig::default();
    let config = GameConfig {
        sets_to_win: row.sets_to_win.unwrap_or(defaults.sets_to_win),
        games_per_set: row.games_per_set.unwrap_or(defaults.games_per_set),
        no_advantage: row.no_advantage.unwrap_or(defaults.no_advantage),
        tie_break_enabled: row.tie_break_enabled.unwrap_or(defaults.tie_break_enabled),
    };
    config
        .validate()
        .map_err(|e| ApiError::Other(format!("match {}: {e}", row.id)))?;

    Ok(MatchRecord {
        team1: row.team1_name.unwrap_or_else(|| "Team 1".to_string()),
        team2: row.team2_name.unwrap_or_else(|| "Team 2".to_string()),
        config,
        snapshot: row.score,
        status: row.status.as_deref().map(parse_status).unwrap_or_default(),
        winner: row.winner.as_deref().and_then(parse_team),
        id: row.id,
    })
}

fn parse_status(s: &str) -> MatchStatus {
    match s {
        "in_progress" | "live" | "playing" => MatchStatus::InProgress,
        "finished" | "completed" | "final" => MatchStatus::Finished,
        _ => MatchStatus::Scheduled,
    }
}

fn parse_team(s: &str) -> Option<TeamId> {
    match s {
        "team1" => Some(TeamId::Team1),
        "team2" => Some(TeamId::Team2),
        _ => None,
    }
}

fn parse_category(s: &str) -> ActionCategory {
    match s {
        "winner" => ActionCategory::Winner,
        "forced_error" => ActionCategory::ForcedError,
        "unforced_error" | "error" => ActionCategory::UnforcedError,
        _ => ActionCategory::Other,
    }
}

fn map_point_action_row(row: PointActionRow) -> PointAction {
    PointAction {
        label: row.label.unwrap_or_else(|| row.code.replace('_', " ")),
        category: row.category.as_deref().map(parse_category).unwrap_or_default(),
        code: row.code,
    }
}

pub fn load_embedded_point_actions() -> ApiResult<Vec<PointAction>> {
    serde_json::from_str(FALLBACK_POINT_ACTIONS_JSON)
        .map_err(|e| ApiError::Other(format!("invalid embedded point actions: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pair, ScoreSnapshot};
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn embedded_point_actions_parse() {
        let actions = load_embedded_point_actions().unwrap();
        assert!(!actions.is_empty());
        assert!(actions.iter().any(|a| a.category == ActionCategory::Winner));
        assert!(actions.iter().any(|a| a.category == ActionCategory::UnforcedError));
    }

    #[test]
    fn match_ids_are_restricted_to_identifier_characters() {
        assert!(checked_id("m-42_b").is_ok());
        assert!(checked_id("").is_err());
        assert!(checked_id("1&select=secret").is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("in_progress"), MatchStatus::InProgress);
        assert_eq!(parse_status("completed"), MatchStatus::Finished);
        assert_eq!(parse_status("scheduled"), MatchStatus::Scheduled);
        assert_eq!(parse_status("???"), MatchStatus::Scheduled);
    }

    #[test]
    fn row_without_format_columns_uses_default_config() {
        let row = MatchRow {
            id: "m1".into(),
            ..MatchRow::default()
        };
        let record = map_match_row(row).unwrap();
        assert_eq!(record.config, GameConfig::default());
        assert_eq!(record.team1, "Team 1");
        assert_eq!(record.snapshot, None);
        assert_eq!(record.status, MatchStatus::Scheduled);
    }

    #[test]
    fn row_with_invalid_format_is_rejected() {
        let row = MatchRow {
            id: "m1".into(),
            games_per_set: Some(0),
            ..MatchRow::default()
        };
        assert!(matches!(map_match_row(row), Err(ApiError::Other(_))));
    }

    #[test]
    fn point_action_row_label_falls_back_to_code() {
        let action = map_point_action_row(PointActionRow {
            code: "net_cord_winner".into(),
            label: None,
            category: Some("winner".into()),
        });
        assert_eq!(action.label, "net cord winner");
        assert_eq!(action.category, ActionCategory::Winner);
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_match_calls() {
        let api = PadelApi::build(None, None);
        assert!(!api.is_configured());
        assert!(matches!(api.fetch_match("m1").await, Err(ApiError::NotConfigured)));
        let actions = api.fetch_point_actions().await.unwrap();
        assert_eq!(actions, load_embedded_point_actions().unwrap());
    }

    #[tokio::test]
    async fn fetch_match_maps_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "eq.m1".into()),
                Matcher::UrlEncoded("select".into(), "*".into()),
            ]))
            .match_header("apikey", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([{
                    "id": "m1",
                    "team1_name": "Galan / Chingotto",
                    "team2_name": "Coello / Tapia",
                    "sets_to_win": 2,
                    "games_per_set": 6,
                    "no_advantage": true,
                    "tie_break_enabled": true,
                    "score": {
                        "sets": [1, 0],
                        "current_set": 2,
                        "current_game": [3, 2],
                        "tie_break": false
                    },
                    "status": "in_progress",
                    "winner": null
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let api = PadelApi::with_base_url(server.url(), Some("secret".into()));
        let record = api.fetch_match("m1").await.unwrap();
        mock.assert_async().await;

        assert_eq!(record.id, "m1");
        assert_eq!(record.team2, "Coello / Tapia");
        assert!(record.config.no_advantage);
        assert_eq!(record.status, MatchStatus::InProgress);
        assert_eq!(record.winner, None);
        let snapshot = record.snapshot.unwrap();
        assert_eq!(snapshot.sets, Pair::new(1, 0));
        assert_eq!(snapshot.current_game, Pair::new(3, 2));
        assert_eq!(snapshot.tie_break_score, None);
    }

    #[tokio::test]
    async fn fetch_match_without_rows_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let api = PadelApi::with_base_url(server.url(), None);
        assert!(matches!(api.fetch_match("missing").await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_score_patches_the_match_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/matches")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.m7".into()))
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "score": {
                    "sets": [2, 1],
                    "current_set": 4,
                    "current_game": [0, 0],
                    "tie_break": false,
                    "tie_break_score": [0, 0]
                },
                "status": "finished",
                "winner": "team1"
            })))
            .with_status(204)
            .create_async()
            .await;

        let api = PadelApi::with_base_url(format!("{}/", server.url()), Some("secret".into()));
        let update = ScoreUpdate {
            snapshot: ScoreSnapshot {
                sets: Pair::new(2, 1),
                current_set: 4,
                current_game: Pair::new(0, 0),
                tie_break: false,
                tie_break_score: Some(Pair::new(0, 0)),
            },
            status: MatchStatus::Finished,
            winner: Some(TeamId::Team1),
        };
        api.save_score("m7", &update).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn save_score_surfaces_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let api = PadelApi::with_base_url(server.url(), None);
        let update = ScoreUpdate {
            snapshot: ScoreSnapshot::default(),
            status: MatchStatus::InProgress,
            winner: None,
        };
        assert!(matches!(api.save_score("m7", &update).await, Err(ApiError::Api(_, _))));
    }

    #[tokio::test]
    async fn point_actions_come_from_backend_when_available() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/point_actions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"code":"chiquita_winner","label":"Chiquita winner","category":"winner"}]"#)
            .create_async()
            .await;

        let api = PadelApi::with_base_url(server.url(), None);
        let actions = api.fetch_point_actions().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].code, "chiquita_winner");
    }

    #[tokio::test]
    async fn point_actions_fall_back_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/point_actions")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let api = PadelApi::with_base_url(server.url(), None);
        let actions = api.fetch_point_actions().await.unwrap();
        assert_eq!(actions, load_embedded_point_actions().unwrap());
    }
}

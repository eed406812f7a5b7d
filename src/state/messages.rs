use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use padel_core::{MatchRecord, PointAction, ScoreUpdate};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadMatch { match_id: String },
    SaveScore { match_id: String, update: ScoreUpdate },
    LoadPointActions,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    /// `record` is None when the backend has no row for the id.
    MatchLoaded { record: Option<MatchRecord> },
    ScoreSaved { match_id: String },
    PointActionsLoaded { actions: Vec<PointAction> },
    /// No backend URL configured; the request was not sent.
    Offline,
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}

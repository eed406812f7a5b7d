use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error, info};
use padel_core::ScoreUpdate;
use padel_core::client::{ApiError, PadelApi};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    client: PadelApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self::with_client(PadelApi::new(), requests, responses)
    }

    pub fn with_client(
        client: PadelApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        if !self.client.is_configured() {
            info!("PADELFLOW_API_URL not set, scoring offline");
        }

        while let Some(request) = self.requests.recv().await {
            let response = match request {
                // The taxonomy has an embedded fallback, so it is served even offline.
                NetworkRequest::LoadPointActions => self.handle_load_point_actions().await,
                _ if !self.client.is_configured() => NetworkResponse::Offline,
                NetworkRequest::LoadMatch { match_id } => {
                    self.with_spinner(self.handle_load_match(match_id)).await
                }
                NetworkRequest::SaveScore { match_id, update } => {
                    self.with_spinner(self.handle_save_score(match_id, update)).await
                }
            };

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn with_spinner<F>(&self, request: F) -> NetworkResponse
    where
        F: Future<Output = Result<NetworkResponse, ApiError>>,
    {
        self.start_loading_animation().await;
        let result = request.await;
        debug!("network request complete");
        self.stop_loading_animation(result.is_ok()).await;
        result.unwrap_or_else(|err| NetworkResponse::Error {
            message: err.to_string(),
        })
    }

    async fn handle_load_match(&self, match_id: String) -> Result<NetworkResponse, ApiError> {
        debug!("loading match {match_id}");
        match self.client.fetch_match(&match_id).await {
            Ok(record) => Ok(NetworkResponse::MatchLoaded { record: Some(record) }),
            Err(ApiError::NotFound(_)) => Ok(NetworkResponse::MatchLoaded { record: None }),
            Err(e) => Err(e),
        }
    }

    async fn handle_save_score(
        &self,
        match_id: String,
        update: ScoreUpdate,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("saving score for {match_id}: {:?}", update.status);
        self.client.save_score(&match_id, &update).await?;
        Ok(NetworkResponse::ScoreSaved { match_id })
    }

    async fn handle_load_point_actions(&self) -> NetworkResponse {
        match self.client.fetch_point_actions().await {
            Ok(actions) => NetworkResponse::PointActionsLoaded { actions },
            Err(e) => NetworkResponse::Error { message: e.to_string() },
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

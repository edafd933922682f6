use crate::state::messages::{NetworkRequest, NetworkResponse};
use campus_api::LayoutConfig;
use campus_api::client::{ApiError, GatewayClient};
use campus_api::credentials::SessionCredentials;
use campus_api::patch::MatchPatch;
use campus_api::session::SnapshotKinds;
use log::{debug, error, info};
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
    client: GatewayClient,
    credentials: Arc<SessionCredentials>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: GatewayClient,
        credentials: Arc<SessionCredentials>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            credentials,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let response = match request {
                NetworkRequest::Login { username, password } => {
                    self.handle_login(username, password).await
                }
                NetworkRequest::LoadSnapshot { generation, kinds } => {
                    Ok(self.handle_load_snapshot(generation, kinds).await)
                }
                NetworkRequest::UpdateMatch { patch } => self.handle_update_match(patch).await,
                NetworkRequest::UpdateLayout { layout } => self.handle_update_layout(layout).await,
            };

            let is_ok = matches!(
                response,
                Ok(ref r) if !matches!(r, NetworkResponse::SnapshotFailed { .. })
            );
            debug!("network request complete");
            self.stop_loading_animation(is_ok).await;

            let response = response.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_login(&self, username: String, password: String) -> Result<NetworkResponse, ApiError> {
        debug!("logging in as {username}");
        let session = self.client.login(&username, &password).await?;
        self.credentials.store(session.clone());
        info!("logged in as {} ({})", session.username, session.role.as_wire());
        Ok(NetworkResponse::LoggedIn { session })
    }

    // Snapshot failures are routed back to the owning session rather than
    // surfacing as a generic error.
    async fn handle_load_snapshot(&self, generation: u64, kinds: SnapshotKinds) -> NetworkResponse {
        debug!("loading snapshot {kinds:?} for generation {generation}");
        match self.client.fetch_snapshot(kinds).await {
            Ok(snapshot) => NetworkResponse::SnapshotLoaded { generation, snapshot },
            Err(e) => {
                error!("snapshot for generation {generation} failed: {e}");
                NetworkResponse::SnapshotFailed { generation, message: e.to_string() }
            }
        }
    }

    async fn handle_update_match(&self, patch: MatchPatch) -> Result<NetworkResponse, ApiError> {
        let id = patch.id.clone().unwrap_or_default();
        debug!("updating match {id}");
        self.client.update_match_fields(&patch).await?;
        Ok(NetworkResponse::WriteCompleted { message: format!("Match {id} updated") })
    }

    async fn handle_update_layout(&self, layout: LayoutConfig) -> Result<NetworkResponse, ApiError> {
        debug!("updating big-screen layout");
        self.client.update_layout(&layout).await?;
        Ok(NetworkResponse::WriteCompleted { message: "Big-screen layout saved".to_string() })
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

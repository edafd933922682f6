use crate::state::network::LoadingState;
use campus_api::LayoutConfig;
use campus_api::credentials::AuthSession;
use campus_api::patch::MatchPatch;
use campus_api::session::{Snapshot, SnapshotKinds};
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    Login { username: String, password: String },
    LoadSnapshot { generation: u64, kinds: SnapshotKinds },
    UpdateMatch { patch: MatchPatch },
    UpdateLayout { layout: LayoutConfig },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LoggedIn { session: AuthSession },
    SnapshotLoaded { generation: u64, snapshot: Snapshot },
    SnapshotFailed { generation: u64, message: String },
    WriteCompleted { message: String },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    Tick,
}

/// A freshly mounted view: fetch its snapshot and open its feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountRequest {
    pub generation: u64,
    pub kinds: SnapshotKinds,
}

/// Work a key press asks the main loop to start.
#[derive(Debug, Clone)]
pub enum Command {
    Mount(MountRequest),
    Network(NetworkRequest),
}

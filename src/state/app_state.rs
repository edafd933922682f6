use crate::app::MenuItem;
use campus_api::session::LiveSession;
use campus_api::{QUADRANTS, Role};
use std::time::{Duration, Instant};

/// How long a toast stays in the status line.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// Mounted view
// ---------------------------------------------------------------------------

/// The view currently on screen and the session feeding it. Replaced
/// wholesale on every tab switch.
#[derive(Debug)]
pub struct ActiveView {
    pub tab: MenuItem,
    /// Identifies this mount; snapshot and feed messages carry it back.
    pub generation: u64,
    pub session: LiveSession,
    /// Selected row in list views.
    pub selected: usize,
    /// Selected quadrant on the big screen (0–3).
    pub selected_quadrant: usize,
}

impl ActiveView {
    pub fn new(tab: MenuItem, generation: u64, session: LiveSession) -> Self {
        Self { tab, generation, session, selected: 0, selected_quadrant: 0 }
    }

    pub fn move_selection(&mut self, delta: isize, row_count: usize) {
        let max = row_count.saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(max);
    }

    /// Keep the selection on a real row after the list shrank.
    pub fn clamp_selection(&mut self, row_count: usize) {
        self.selected = self.selected.min(row_count.saturating_sub(1));
    }

    pub fn move_quadrant(&mut self, delta: isize) {
        let n = QUADRANTS as isize;
        self.selected_quadrant = (self.selected_quadrant as isize + delta).rem_euclid(n) as usize;
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, now: Instant) -> Self {
        Self { message: message.into(), level, expires_at: now + NOTIFICATION_TTL }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ---------------------------------------------------------------------------
// Auth / feed status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub username: Option<String>,
    /// Unknown until a login; a pre-issued token carries no role.
    pub role: Option<Role>,
    pub has_token: bool,
}

impl AuthState {
    pub fn can_keep_score(&self) -> bool {
        self.has_token && self.role.is_none_or(|r| r.can_keep_score())
    }

    pub fn can_edit_layout(&self) -> bool {
        self.has_token && self.role.is_none_or(|r| r.can_edit_layout())
    }

    pub fn label(&self) -> String {
        match (&self.username, self.role) {
            (Some(user), Some(role)) => format!("{user} ({})", role.as_wire()),
            (Some(user), None) => user.clone(),
            (None, _) if self.has_token => "token".to_string(),
            (None, _) => "read-only".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedState {
    #[default]
    Connecting,
    Online,
    Offline,
    /// Reconnects exhausted; remount the view to try again.
    Stopped,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub view: Option<ActiveView>,
    pub auth: AuthState,
    pub notification: Option<Notification>,
    pub feed: FeedState,
    generation: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// The mounted view, if `generation` is still the current mount.
    pub fn view_for(&mut self, generation: u64) -> Option<&mut ActiveView> {
        self.view.as_mut().filter(|v| v.generation == generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::session::Strategy;

    fn view() -> ActiveView {
        ActiveView::new(MenuItem::Live, 1, LiveSession::new(Strategy::IncrementalPatch))
    }

    #[test]
    fn selection_stays_within_rows() {
        let mut v = view();
        v.move_selection(-1, 3);
        assert_eq!(v.selected, 0);
        v.move_selection(5, 3);
        assert_eq!(v.selected, 2);
        v.clamp_selection(1);
        assert_eq!(v.selected, 0);
        v.move_selection(1, 0);
        assert_eq!(v.selected, 0);
    }

    #[test]
    fn quadrant_selection_wraps() {
        let mut v = view();
        v.move_quadrant(-1);
        assert_eq!(v.selected_quadrant, 3);
        v.move_quadrant(2);
        assert_eq!(v.selected_quadrant, 1);
    }

    #[test]
    fn notifications_expire() {
        let now = Instant::now();
        let n = Notification::new("saved", NotificationLevel::Info, now);
        assert!(!n.is_expired(now));
        assert!(n.is_expired(now + NOTIFICATION_TTL));
    }

    #[test]
    fn write_permissions_follow_role() {
        let mut auth = AuthState::default();
        assert!(!auth.can_keep_score());
        assert_eq!(auth.label(), "read-only");

        auth.has_token = true;
        assert!(auth.can_keep_score() && auth.can_edit_layout());

        auth.role = Some(Role::Scorekeeper);
        auth.username = Some("ana".into());
        assert!(auth.can_keep_score());
        assert!(!auth.can_edit_layout());
        assert_eq!(auth.label(), "ana (scorekeeper)");

        auth.role = Some(Role::User);
        assert!(!auth.can_keep_score());
    }

    #[test]
    fn stale_generation_finds_no_view() {
        let mut state = AppState::new();
        let generation = state.next_generation();
        state.view = Some(ActiveView::new(MenuItem::Live, generation, LiveSession::default()));
        assert!(state.view_for(generation).is_some());
        assert!(state.view_for(generation - 1).is_none());
    }
}

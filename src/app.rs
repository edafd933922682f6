use crate::state::app_settings::AppSettings;
use crate::state::app_state::{ActiveView, AppState, FeedState, Notification, NotificationLevel};
use crate::state::feed::{FeedEvent, FeedMessage};
use crate::state::messages::{MountRequest, NetworkRequest};
use campus_api::credentials::AuthSession;
use campus_api::patch::MatchPatch;
use campus_api::reconcile::Outcome;
use campus_api::session::{
    EventAction, LiveSession, Snapshot, SnapshotAction, SnapshotKinds, Strategy,
};
use campus_api::view::{self, MatchRow, MatchView};
use campus_api::{MatchStatus, Side};
use log::{debug, error, info, warn};
use std::time::Instant;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuItem {
    #[default]
    Live,
    Schedule,
    Results,
    BigScreen,
    Teams,
    Help,
}

impl MenuItem {
    pub fn title(&self) -> &'static str {
        match self {
            MenuItem::Live => "Live",
            MenuItem::Schedule => "Schedule",
            MenuItem::Results => "Results",
            MenuItem::BigScreen => "Big Screen",
            MenuItem::Teams => "Teams",
            MenuItem::Help => "Help",
        }
    }

    /// Reconciliation strategy for the view; Help has no live data.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            MenuItem::Live | MenuItem::BigScreen => Some(Strategy::IncrementalPatch),
            MenuItem::Schedule | MenuItem::Results | MenuItem::Teams => Some(Strategy::FullRefresh),
            MenuItem::Help => None,
        }
    }

    pub fn snapshot_kinds(&self) -> SnapshotKinds {
        match self {
            MenuItem::Live | MenuItem::Schedule | MenuItem::Results => {
                SnapshotKinds { matches: true, teams: true, ..SnapshotKinds::default() }
            }
            MenuItem::BigScreen => SnapshotKinds {
                matches: true,
                teams: true,
                sports: true,
                layout: true,
                ..SnapshotKinds::default()
            },
            MenuItem::Teams => SnapshotKinds {
                teams: true,
                schools: true,
                sports: true,
                ..SnapshotKinds::default()
            },
            MenuItem::Help => SnapshotKinds::default(),
        }
    }

    pub fn match_view(&self) -> Option<MatchView> {
        match self {
            MenuItem::Live => Some(MatchView::live()),
            MenuItem::Schedule => Some(MatchView::upcoming()),
            MenuItem::Results => Some(MatchView::results()),
            _ => None,
        }
    }
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new() -> Self {
        let app = Self::with_settings(AppSettings::load());

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let mut state = AppState::new();
        state.auth.has_token = settings.token.is_some();
        Self { state, settings }
    }

    /// Work to kick off once the UI is up: an optional login and the first mount.
    pub fn start(&mut self) -> (Option<NetworkRequest>, Option<MountRequest>) {
        let login = self
            .settings
            .login()
            .map(|(username, password)| NetworkRequest::Login { username, password });
        let mount = self.mount(self.state.active_tab);
        (login, mount)
    }

    // -----------------------------------------------------------------------
    // Tab management: each data tab owns a fresh session while it is shown
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) -> Option<MountRequest> {
        if self.state.active_tab == next {
            return None;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;

        // Help is an overlay; the view underneath stays subscribed.
        if next == MenuItem::Help || self.state.view.as_ref().is_some_and(|v| v.tab == next) {
            return None;
        }
        self.mount(next)
    }

    pub fn exit_help(&mut self) -> Option<MountRequest> {
        if self.state.active_tab != MenuItem::Help {
            return None;
        }
        let previous = self.state.previous_tab;
        self.state.active_tab = previous;
        if self.state.view.as_ref().is_some_and(|v| v.tab == previous) {
            return None;
        }
        self.mount(previous)
    }

    fn mount(&mut self, tab: MenuItem) -> Option<MountRequest> {
        self.unmount();
        let strategy = tab.strategy()?;

        let generation = self.state.next_generation();
        let mut session = LiveSession::new(strategy).watching(tab.snapshot_kinds());
        if let Err(e) = session.begin() {
            error!("could not start {} session: {e}", tab.title());
            return None;
        }
        self.state.view = Some(ActiveView::new(tab, generation, session));
        self.state.feed = FeedState::Connecting;
        info!("mounted {} view (generation {generation}, {strategy:?})", tab.title());

        Some(MountRequest { generation, kinds: tab.snapshot_kinds() })
    }

    pub fn unmount(&mut self) {
        if let Some(mut view) = self.state.view.take() {
            view.session.close();
            debug!("unmounted {} view (generation {})", view.tab.title(), view.generation);
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Network response handlers: called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Returns a refetch request when a full-refresh view owes one.
    pub fn on_snapshot_loaded(&mut self, generation: u64, snapshot: Snapshot) -> Option<NetworkRequest> {
        let Some(active) = self.state.view_for(generation) else {
            debug!("discarding snapshot for stale generation {generation}");
            return None;
        };

        match active.session.on_snapshot(snapshot) {
            SnapshotAction::Applied { replayed } => {
                debug!("{} snapshot applied, {replayed} queued events replayed", active.tab.title());
                let rows = row_count(active);
                active.clamp_selection(rows);
                None
            }
            SnapshotAction::RefetchRequested => Some(NetworkRequest::LoadSnapshot {
                generation,
                kinds: active.tab.snapshot_kinds(),
            }),
            SnapshotAction::Discarded => None,
        }
    }

    pub fn on_snapshot_failed(&mut self, generation: u64, message: String) {
        let Some(active) = self.state.view_for(generation) else {
            debug!("ignoring snapshot failure for stale generation {generation}");
            return;
        };
        let title = active.tab.title();
        active.session.on_snapshot_failed(message.as_str());
        self.notify(format!("Could not load {title}: {message}"), NotificationLevel::Error);
    }

    pub fn on_feed_message(&mut self, message: FeedMessage) -> Option<NetworkRequest> {
        let FeedMessage { generation, event } = message;
        let Some(active) = self.state.view_for(generation) else {
            debug!("discarding feed message for stale generation {generation}");
            return None;
        };

        match event {
            FeedEvent::Change(event) => {
                let name = event.name();
                match active.session.on_event(event) {
                    EventAction::Applied(Outcome::Dropped(reason)) => {
                        warn!("dropped {name} event: {reason}");
                    }
                    EventAction::Applied(Outcome::Merged { transition: Some((from, to)) }) => {
                        info!("{name}: match moved {} -> {}", from.label(), to.label());
                    }
                    EventAction::Applied(outcome) => debug!("{name}: {outcome:?}"),
                    EventAction::Queued => debug!("{name} queued until snapshot lands"),
                    EventAction::Discarded => debug!("{name} discarded"),
                    EventAction::Ignored => {
                        debug!("{name} is not shown on {}", active.tab.title());
                        return None;
                    }
                    EventAction::RefetchRequested => {
                        debug!("{name} triggers a {} refetch", active.tab.title());
                        return Some(NetworkRequest::LoadSnapshot {
                            generation,
                            kinds: active.tab.snapshot_kinds(),
                        });
                    }
                }
                let rows = row_count(active);
                active.clamp_selection(rows);
            }
            FeedEvent::Connected => {
                info!("live feed connected");
                self.state.feed = FeedState::Online;
            }
            FeedEvent::Disconnected => {
                warn!("live feed disconnected, retrying");
                self.state.feed = FeedState::Offline;
            }
            FeedEvent::Error(message) => warn!("{message}"),
            FeedEvent::GaveUp => {
                self.state.feed = FeedState::Stopped;
                self.notify("Live updates stopped; switch tabs to reconnect", NotificationLevel::Error);
            }
        }
        None
    }

    pub fn on_logged_in(&mut self, session: AuthSession) {
        self.state.auth.username = Some(session.username.clone());
        self.state.auth.role = Some(session.role);
        self.state.auth.has_token = true;
        self.notify(format!("Logged in as {}", session.username), NotificationLevel::Info);
    }

    pub fn on_write_completed(&mut self, message: String) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn on_error(&mut self, message: String) {
        self.notify(message, NotificationLevel::Error);
    }

    /// Expire the toast. Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.state.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.state.notification = None;
            return true;
        }
        false
    }

    fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.state.notification = Some(Notification::new(message, level, Instant::now()));
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn move_selection(&mut self, delta: isize) {
        if let Some(active) = self.state.view.as_mut() {
            let rows = row_count(active);
            active.move_selection(delta, rows);
        }
    }

    pub fn move_quadrant(&mut self, delta: isize) {
        if let Some(active) = self.state.view.as_mut()
            && active.tab == MenuItem::BigScreen
        {
            active.move_quadrant(delta);
        }
    }

    pub fn selected_match(&self) -> Option<MatchRow> {
        let active = self.state.view.as_ref()?;
        let view = active.tab.match_view()?;
        let model = active.session.model();
        view::project_matches(&model.matches, &model.teams, &view)
            .into_iter()
            .nth(active.selected)
    }

    // -----------------------------------------------------------------------
    // Scorekeeping: writes go to the gateway; the feed brings the result back
    // -----------------------------------------------------------------------

    pub fn adjust_score(&mut self, side: Side, delta: i32) -> Option<NetworkRequest> {
        if !self.state.auth.can_keep_score() {
            self.notify("Scorekeeping needs a scorekeeper login", NotificationLevel::Error);
            return None;
        }
        let row = self.selected_match()?;
        let bump = |points: u32| {
            if delta < 0 { points.saturating_sub(delta.unsigned_abs()) } else { points.saturating_add(delta as u32) }
        };
        let (a, b) = match side {
            Side::A => (bump(row.points_a), row.points_b),
            Side::B => (row.points_a, bump(row.points_b)),
        };
        if (a, b) == (row.points_a, row.points_b) {
            return None;
        }
        Some(NetworkRequest::UpdateMatch { patch: MatchPatch::score(&row.id, a, b, row.status) })
    }

    pub fn cycle_status(&mut self) -> Option<NetworkRequest> {
        if !self.state.auth.can_keep_score() {
            self.notify("Changing match status needs a scorekeeper login", NotificationLevel::Error);
            return None;
        }
        let row = self.selected_match()?;
        let next: MatchStatus = row.status.next();
        info!("match {} status {} -> {}", row.id, row.status.label(), next.label());
        Some(NetworkRequest::UpdateMatch {
            patch: MatchPatch::score(&row.id, row.points_a, row.points_b, next),
        })
    }

    // -----------------------------------------------------------------------
    // Big-screen layout editing
    // -----------------------------------------------------------------------

    pub fn cycle_quadrant_sport(&mut self) -> Option<NetworkRequest> {
        if !self.state.auth.can_edit_layout() {
            self.notify("Editing the big screen needs an admin login", NotificationLevel::Error);
            return None;
        }
        let active = self.state.view.as_ref().filter(|v| v.tab == MenuItem::BigScreen)?;
        let model = active.session.model();
        let sports = view::project_sports(&model.sports);
        if sports.is_empty() {
            self.notify("No sports loaded", NotificationLevel::Error);
            return None;
        }

        let quadrant = active.selected_quadrant;
        let next = match model.layout.slot(quadrant) {
            Some(current) => sports
                .iter()
                .position(|s| s.id == current)
                .map_or(0, |idx| (idx + 1) % sports.len()),
            None => 0,
        };
        let mut layout = model.layout.clone();
        layout.assign(quadrant, Some(sports[next].id.clone()));
        Some(NetworkRequest::UpdateLayout { layout })
    }

    pub fn clear_quadrant(&mut self) -> Option<NetworkRequest> {
        if !self.state.auth.can_edit_layout() {
            self.notify("Editing the big screen needs an admin login", NotificationLevel::Error);
            return None;
        }
        let active = self.state.view.as_ref().filter(|v| v.tab == MenuItem::BigScreen)?;
        let quadrant = active.selected_quadrant;
        let model = active.session.model();
        model.layout.slot(quadrant)?;

        let mut layout = model.layout.clone();
        layout.assign(quadrant, None);
        Some(NetworkRequest::UpdateLayout { layout })
    }
}

fn row_count(active: &ActiveView) -> usize {
    let model = active.session.model();
    match active.tab {
        MenuItem::Teams => model.teams.len(),
        tab => tab
            .match_view()
            .map(|v| model.matches.values().filter(|m| v.filter.accepts(m)).count())
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::events::LiveEvent;
    use campus_api::reconcile::Change;
    use campus_api::session::SessionState;
    use campus_api::{LayoutConfig, Match, Role, Sport};

    fn app() -> App {
        App::with_settings(AppSettings { token: Some("tok".into()), ..AppSettings::default() })
    }

    fn live_match(id: &str, a: u32, b: u32) -> Match {
        Match {
            id: id.into(),
            sport: "Futsal".into(),
            team_a: "t1".into(),
            team_b: "t2".into(),
            points_a: a,
            points_b: b,
            status: MatchStatus::Live,
            ..Default::default()
        }
    }

    fn feed(generation: u64, event: LiveEvent) -> FeedMessage {
        FeedMessage { generation, event: FeedEvent::Change(event) }
    }

    fn score_event(id: &str, status: MatchStatus, a: u32, b: u32) -> LiveEvent {
        LiveEvent::Match(Change::ScoreUpdate(MatchPatch::score(id, a, b, status)))
    }

    #[test]
    fn start_mounts_live_view_and_logs_in_when_configured() {
        let mut app = App::with_settings(AppSettings {
            username: Some("ana".into()),
            password: Some("pw".into()),
            ..AppSettings::default()
        });
        let (login, mount) = app.start();
        assert!(matches!(login, Some(NetworkRequest::Login { ref username, .. }) if username == "ana"));
        let mount = mount.unwrap();
        assert_eq!(mount.kinds, MenuItem::Live.snapshot_kinds());
        let view = app.state.view.as_ref().unwrap();
        assert_eq!(view.session.state(), SessionState::Connecting);
        assert_eq!(view.generation, mount.generation);
    }

    #[test]
    fn switching_tabs_remounts_with_new_generation() {
        let mut app = app();
        let first = app.start().1.unwrap();
        let second = app.update_tab(MenuItem::Schedule).unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(app.state.view.as_ref().map(|v| v.tab), Some(MenuItem::Schedule));
        assert!(app.update_tab(MenuItem::Schedule).is_none());
    }

    #[test]
    fn help_keeps_the_view_underneath() {
        let mut app = app();
        let mount = app.start().1.unwrap();
        assert!(app.update_tab(MenuItem::Help).is_none());
        assert!(app.exit_help().is_none());
        assert_eq!(app.state.active_tab, MenuItem::Live);
        assert_eq!(app.state.view.as_ref().map(|v| v.generation), Some(mount.generation));
    }

    #[test]
    fn stale_messages_are_ignored_after_tab_switch() {
        let mut app = app();
        let old = app.start().1.unwrap();
        let new = app.update_tab(MenuItem::BigScreen).unwrap();

        let snapshot = Snapshot { matches: vec![live_match("m1", 1, 0)], ..Default::default() };
        assert!(app.on_snapshot_loaded(old.generation, snapshot).is_none());
        assert!(app.on_feed_message(feed(old.generation, score_event("m9", MatchStatus::Live, 1, 1))).is_none());

        let view = app.state.view.as_ref().unwrap();
        assert_eq!(view.generation, new.generation);
        assert_eq!(view.session.state(), SessionState::Connecting);
        assert_eq!(view.session.pending(), 0);
    }

    #[test]
    fn live_view_patches_incrementally() {
        let mut app = app();
        let mount = app.start().1.unwrap();
        app.on_feed_message(feed(mount.generation, score_event("m1", MatchStatus::Live, 2, 0)));
        app.on_snapshot_loaded(mount.generation, Snapshot::default());

        assert_eq!(app.selected_match().map(|r| r.points_a), Some(2));
        app.on_feed_message(feed(mount.generation, score_event("m1", MatchStatus::Completed, 3, 0)));
        assert!(app.selected_match().is_none());
    }

    #[test]
    fn full_refresh_view_asks_for_refetch() {
        let mut app = app();
        app.start();
        let mount = app.update_tab(MenuItem::Results).unwrap();
        app.on_snapshot_loaded(mount.generation, Snapshot::default());

        let request = app.on_feed_message(feed(mount.generation, score_event("m1", MatchStatus::Completed, 3, 1)));
        assert!(matches!(request, Some(NetworkRequest::LoadSnapshot { generation, .. }) if generation == mount.generation));
    }

    #[test]
    fn refresh_views_skip_events_they_do_not_show() {
        let mut app = app();
        app.start();
        let teams = app.update_tab(MenuItem::Teams).unwrap();
        app.on_snapshot_loaded(teams.generation, Snapshot::default());
        let score = feed(teams.generation, score_event("m1", MatchStatus::Live, 1, 0));
        assert!(app.on_feed_message(score).is_none());

        let results = app.update_tab(MenuItem::Results).unwrap();
        app.on_snapshot_loaded(results.generation, Snapshot::default());
        let layout = feed(results.generation, LiveEvent::Layout(LayoutConfig::default()));
        assert!(app.on_feed_message(layout).is_none());

        let score = feed(results.generation, score_event("m1", MatchStatus::Completed, 3, 1));
        assert!(app.on_feed_message(score).is_some());
    }

    #[test]
    fn snapshot_failure_shows_toast_and_keeps_view() {
        let mut app = app();
        let mount = app.start().1.unwrap();
        app.on_snapshot_failed(mount.generation, "timed out".into());

        let toast = app.state.notification.as_ref().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert!(toast.message.contains("timed out"));
        let view = app.state.view.as_ref().unwrap();
        assert_eq!(view.session.load_error(), Some("timed out"));
        assert_eq!(view.session.state(), SessionState::Subscribed);

        assert!(!app.on_tick(Instant::now()));
        assert!(app.on_tick(Instant::now() + crate::state::app_state::NOTIFICATION_TTL));
        assert!(app.state.notification.is_none());
    }

    #[test]
    fn score_keys_build_patches_for_selected_match() {
        let mut app = app();
        let mount = app.start().1.unwrap();
        app.on_snapshot_loaded(
            mount.generation,
            Snapshot { matches: vec![live_match("m1", 0, 4)], ..Default::default() },
        );

        let Some(NetworkRequest::UpdateMatch { patch }) = app.adjust_score(Side::A, 1) else {
            panic!("expected a match update");
        };
        assert_eq!(patch, MatchPatch::score("m1", 1, 4, MatchStatus::Live));

        let Some(NetworkRequest::UpdateMatch { patch }) = app.adjust_score(Side::B, -1) else {
            panic!("expected a match update");
        };
        assert_eq!((patch.points_a, patch.points_b), (Some(0), Some(3)));

        assert!(app.adjust_score(Side::A, -1).is_none(), "score never goes below zero");

        let Some(NetworkRequest::UpdateMatch { patch }) = app.cycle_status() else {
            panic!("expected a status update");
        };
        assert_eq!(patch.status, Some(MatchStatus::Completed));
    }

    #[test]
    fn read_only_users_cannot_write() {
        let mut app = App::with_settings(AppSettings::default());
        let mount = app.start().1.unwrap();
        app.on_snapshot_loaded(
            mount.generation,
            Snapshot { matches: vec![live_match("m1", 0, 0)], ..Default::default() },
        );
        assert!(app.adjust_score(Side::A, 1).is_none());
        assert!(app.state.notification.is_some());

        app.on_logged_in(AuthSession { username: "kim".into(), token: "t".into(), role: Role::User });
        assert!(app.cycle_status().is_none());
    }

    #[test]
    fn quadrant_sport_cycles_through_loaded_sports() {
        let mut app = app();
        app.start();
        let mount = app.update_tab(MenuItem::BigScreen).unwrap();
        app.on_snapshot_loaded(
            mount.generation,
            Snapshot {
                sports: vec![
                    Sport { id: "s2".into(), name: "Volleyball".into() },
                    Sport { id: "s1".into(), name: "Futsal".into() },
                ],
                layout: Some(LayoutConfig::from_slots(vec![None, Some("s1".into())])),
                ..Default::default()
            },
        );

        let Some(NetworkRequest::UpdateLayout { layout }) = app.cycle_quadrant_sport() else {
            panic!("expected a layout update");
        };
        assert_eq!(layout.slot(0), Some("s1"), "empty slot takes the first sport by name");

        app.move_quadrant(1);
        let Some(NetworkRequest::UpdateLayout { layout }) = app.cycle_quadrant_sport() else {
            panic!("expected a layout update");
        };
        assert_eq!(layout.slot(1), Some("s2"));

        let Some(NetworkRequest::UpdateLayout { layout }) = app.clear_quadrant() else {
            panic!("expected a layout update");
        };
        assert_eq!(layout.slot(1), None);
        assert_eq!(layout.slot(0), None, "writes are built from the cached layout, not applied locally");
    }

    #[test]
    fn feed_give_up_surfaces_a_toast() {
        let mut app = app();
        let mount = app.start().1.unwrap();
        app.on_feed_message(FeedMessage { generation: mount.generation, event: FeedEvent::Connected });
        assert_eq!(app.state.feed, FeedState::Online);
        app.on_feed_message(FeedMessage { generation: mount.generation, event: FeedEvent::GaveUp });
        assert_eq!(app.state.feed, FeedState::Stopped);
        assert!(app.state.notification.is_some());
    }
}

//! Lifecycle of one mounted view's live data.
//!
//! A session starts `Idle`, moves to `Connecting` while its snapshot is in
//! flight, becomes `Subscribed` once the snapshot (or its failure) lands and
//! ends `Closed`. Events are only ever applied one at a time by the caller's
//! loop, so the session itself holds no locks.

use crate::cache::CollectionCache;
use crate::events::LiveEvent;
use crate::reconcile::{Outcome, reconcile};
use crate::{LayoutConfig, Match, School, Sport, Team};
use std::collections::VecDeque;
use std::fmt;

/// Which collections a view needs in its snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotKinds {
    pub matches: bool,
    pub teams: bool,
    pub schools: bool,
    pub sports: bool,
    pub layout: bool,
}

impl SnapshotKinds {
    pub fn all() -> Self {
        Self { matches: true, teams: true, schools: true, sports: true, layout: true }
    }

    /// Whether `event` touches a collection in this set.
    pub fn covers(&self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::Match(_) => self.matches,
            LiveEvent::Team(_) => self.teams,
            LiveEvent::School(_) => self.schools,
            LiveEvent::Layout(_) => self.layout,
        }
    }
}

/// Full collections fetched from the gateway in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub matches: Vec<Match>,
    pub teams: Vec<Team>,
    pub schools: Vec<School>,
    pub sports: Vec<Sport>,
    pub layout: Option<LayoutConfig>,
}

/// The caches backing one view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveModel {
    pub matches: CollectionCache<Match>,
    pub teams: CollectionCache<Team>,
    pub schools: CollectionCache<School>,
    pub sports: CollectionCache<Sport>,
    pub layout: LayoutConfig,
}

impl LiveModel {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            matches: CollectionCache::from_snapshot(snapshot.matches),
            teams: CollectionCache::from_snapshot(snapshot.teams),
            schools: CollectionCache::from_snapshot(snapshot.schools),
            sports: CollectionCache::from_snapshot(snapshot.sports),
            layout: snapshot.layout.unwrap_or_default(),
        }
    }

    pub fn apply(&mut self, event: LiveEvent) -> Outcome {
        match event {
            LiveEvent::Match(change) => reconcile(&mut self.matches, change),
            LiveEvent::Team(change) => reconcile(&mut self.teams, change),
            LiveEvent::School(change) => reconcile(&mut self.schools, change),
            LiveEvent::Layout(layout) => {
                self.layout = layout;
                Outcome::Replaced
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Subscribed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Subscribed => "subscribed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// How a view reacts to change events once subscribed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Patch the caches in place with each event.
    #[default]
    IncrementalPatch,
    /// Ignore event payloads and refetch the whole snapshot.
    FullRefresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Session is not accepting events; nothing changed.
    Discarded,
    /// Event touches nothing the view shows; nothing changed.
    Ignored,
    /// Held until the snapshot lands.
    Queued,
    Applied(Outcome),
    /// Caller should fetch a fresh snapshot and hand it to `on_snapshot`.
    RefetchRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAction {
    Applied { replayed: usize },
    RefetchRequested,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTransition { from: SessionState, to: SessionState },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { from, to } => {
                write!(f, "cannot move session from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Default)]
pub struct LiveSession {
    strategy: Strategy,
    state: SessionState,
    model: LiveModel,
    pending: VecDeque<LiveEvent>,
    refetch_owed: bool,
    refetching: bool,
    load_error: Option<String>,
    /// Collections the view shows. `None` accepts every event.
    watching: Option<SnapshotKinds>,
}

impl LiveSession {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy, ..Self::default() }
    }

    /// Limit the session to events on these collections.
    pub fn watching(mut self, kinds: SnapshotKinds) -> Self {
        self.watching = Some(kinds);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn model(&self) -> &LiveModel {
        &self.model
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Connecting,
            });
        }
        self.state = SessionState::Connecting;
        Ok(())
    }

    pub fn on_event(&mut self, event: LiveEvent) -> EventAction {
        match (self.state, self.strategy) {
            (SessionState::Idle | SessionState::Closed, _) => EventAction::Discarded,
            _ if self.watching.is_some_and(|kinds| !kinds.covers(&event)) => EventAction::Ignored,
            (SessionState::Connecting, Strategy::IncrementalPatch) => {
                self.pending.push_back(event);
                EventAction::Queued
            }
            (SessionState::Connecting, Strategy::FullRefresh) => {
                self.refetch_owed = true;
                EventAction::Queued
            }
            (SessionState::Subscribed, Strategy::IncrementalPatch) => {
                EventAction::Applied(self.model.apply(event))
            }
            (SessionState::Subscribed, Strategy::FullRefresh) => {
                // One refetch in flight at a time; bursts collapse into one more.
                if self.refetching {
                    self.refetch_owed = true;
                    EventAction::Queued
                } else {
                    self.refetching = true;
                    EventAction::RefetchRequested
                }
            }
        }
    }

    pub fn on_snapshot(&mut self, snapshot: Snapshot) -> SnapshotAction {
        match self.state {
            SessionState::Idle | SessionState::Closed => SnapshotAction::Discarded,
            SessionState::Connecting | SessionState::Subscribed => {
                self.model = LiveModel::from_snapshot(snapshot);
                self.load_error = None;
                self.state = SessionState::Subscribed;
                self.refetching = false;

                let mut replayed = 0;
                while let Some(event) = self.pending.pop_front() {
                    self.model.apply(event);
                    replayed += 1;
                }

                if std::mem::take(&mut self.refetch_owed) {
                    self.refetching = true;
                    SnapshotAction::RefetchRequested
                } else {
                    SnapshotAction::Applied { replayed }
                }
            }
        }
    }

    /// The view stays up with whatever it has; nothing is retried.
    pub fn on_snapshot_failed(&mut self, message: impl Into<String>) {
        match self.state {
            SessionState::Idle | SessionState::Closed => {}
            SessionState::Connecting => {
                self.model = LiveModel::default();
                self.load_error = Some(message.into());
                self.state = SessionState::Subscribed;
                self.refetch_owed = false;
                while let Some(event) = self.pending.pop_front() {
                    self.model.apply(event);
                }
            }
            SessionState::Subscribed => {
                self.load_error = Some(message.into());
                self.refetch_owed = false;
                self.refetching = false;
            }
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        self.pending.clear();
        self.refetch_owed = false;
        self.refetching = false;
    }
}

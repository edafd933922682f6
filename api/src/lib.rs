pub mod cache;
pub mod client;
pub mod credentials;
pub mod events;
pub mod patch;
pub mod reconcile;
pub mod session;
pub mod validate;
pub mod view;
pub mod wire;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the gateway wire format
// ---------------------------------------------------------------------------

/// Number of big-screen quadrants.
pub const QUADRANTS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub sport: String, // sport name, e.g. "Basketball"
    pub team_a: String, // team id
    pub team_b: String, // team id
    pub points_a: u32,
    pub points_b: u32,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: String,
    pub court_number: Option<String>,
    pub referee_name: Option<String>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Side::A => "Team A",
            Side::B => "Team B",
        }
    }
}

/// Canonical match status. The gateway speaks two vocabularies
/// (`scheduled/live/completed` and `upcoming/live/finished`); both are folded
/// into this enum at the wire boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "ongoing" | "in_progress" | "inprogress" => MatchStatus::Live,
            "completed" | "finished" | "final" | "done" => MatchStatus::Completed,
            _ => MatchStatus::Scheduled,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCH",
            MatchStatus::Live => "LIVE",
            MatchStatus::Completed => "FNL",
        }
    }

    /// Scorekeeper cycle: scheduled → live → completed → scheduled.
    pub fn next(self) -> Self {
        match self {
            MatchStatus::Scheduled => MatchStatus::Live,
            MatchStatus::Live => MatchStatus::Completed,
            MatchStatus::Completed => MatchStatus::Scheduled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub school: String, // school id
    pub sport: String,  // sport id
    pub gender: Gender,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "men" | "boys" => Some(Gender::Male),
            "f" | "female" | "women" | "girls" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct School {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sport {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Lv2Admin,
    Scorekeeper,
    #[default]
    User,
}

impl Role {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Role::SuperAdmin,
            "lv2admin" => Role::Lv2Admin,
            "scorekeeper" => Role::Scorekeeper,
            _ => Role::User,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Lv2Admin => "lv2admin",
            Role::Scorekeeper => "scorekeeper",
            Role::User => "user",
        }
    }

    /// Roles allowed to push score and status changes.
    pub fn can_keep_score(&self) -> bool {
        !matches!(self, Role::User)
    }

    /// Roles allowed to rearrange the big screen.
    pub fn can_edit_layout(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Lv2Admin)
    }
}

/// Big-screen quadrant assignment: four slots, each empty or holding a sport id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutConfig {
    pub slots: [Option<String>; QUADRANTS],
}

impl LayoutConfig {
    /// Build from a gateway slot list, padding short lists and dropping extras.
    pub fn from_slots(slots: Vec<Option<String>>) -> Self {
        let mut iter = slots
            .into_iter()
            .map(|s| s.filter(|id| !id.trim().is_empty()));
        Self {
            slots: std::array::from_fn(|_| iter.next().flatten()),
        }
    }

    pub fn slot(&self, idx: usize) -> Option<&str> {
        self.slots.get(idx).and_then(|s| s.as_deref())
    }

    pub fn assign(&mut self, idx: usize, sport_id: Option<String>) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = sport_id;
        }
    }
}

//! Projections from caches to display rows.
//!
//! Everything here is a pure function of its inputs: the same caches always
//! produce the same rows, in the same order.

use crate::cache::CollectionCache;
use crate::{Gender, LayoutConfig, Match, MatchStatus, QUADRANTS, School, Side, Sport, Team};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub const UNKNOWN_SCHOOL: &str = "Unknown school";
pub const UNKNOWN_SPORT: &str = "Unknown sport";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    MostRecentFirst,
    SoonestFirst,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Empty accepts every status.
    pub statuses: Vec<MatchStatus>,
    /// Sport name, compared case-insensitively.
    pub sport: Option<String>,
}

impl MatchFilter {
    pub fn accepts(&self, m: &Match) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&m.status);
        let sport_ok = self
            .sport
            .as_deref()
            .is_none_or(|sport| m.sport.eq_ignore_ascii_case(sport));
        status_ok && sport_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchView {
    pub filter: MatchFilter,
    pub order: SortOrder,
}

impl MatchView {
    pub fn live() -> Self {
        Self::with_status(MatchStatus::Live, SortOrder::MostRecentFirst)
    }

    pub fn upcoming() -> Self {
        Self::with_status(MatchStatus::Scheduled, SortOrder::SoonestFirst)
    }

    pub fn results() -> Self {
        Self::with_status(MatchStatus::Completed, SortOrder::MostRecentFirst)
    }

    pub fn for_sport(mut self, sport: impl Into<String>) -> Self {
        self.filter.sport = Some(sport.into());
        self
    }

    fn with_status(status: MatchStatus, order: SortOrder) -> Self {
        Self {
            filter: MatchFilter { statuses: vec![status], sport: None },
            order,
        }
    }
}

/// A match joined with its team names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub id: String,
    pub sport: String,
    pub team_a: String,
    pub team_b: String,
    pub points_a: u32,
    pub points_b: u32,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: String,
    pub court_number: Option<String>,
    pub referee_name: Option<String>,
}

impl MatchRow {
    pub fn leader(&self) -> Option<Side> {
        match self.points_a.cmp(&self.points_b) {
            Ordering::Greater => Some(Side::A),
            Ordering::Less => Some(Side::B),
            Ordering::Equal => None,
        }
    }
}

pub fn project_matches(
    matches: &CollectionCache<Match>,
    teams: &CollectionCache<Team>,
    view: &MatchView,
) -> Vec<MatchRow> {
    project_where(matches, teams, view.order, |m| view.filter.accepts(m))
}

fn project_where(
    matches: &CollectionCache<Match>,
    teams: &CollectionCache<Team>,
    order: SortOrder,
    keep: impl Fn(&Match) -> bool,
) -> Vec<MatchRow> {
    let mut selected: Vec<&Match> = matches.values().filter(|m| keep(m)).collect();
    selected.sort_by(|a, b| compare(order, a, b));
    selected.into_iter().map(|m| join(m, teams)).collect()
}

// Missing times sort last in either direction; id breaks every tie.
fn compare(order: SortOrder, a: &Match, b: &Match) -> Ordering {
    let by_time = match (a.scheduled_at, b.scheduled_at) {
        (Some(x), Some(y)) => match order {
            SortOrder::MostRecentFirst => y.cmp(&x),
            SortOrder::SoonestFirst => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then_with(|| a.id.cmp(&b.id))
}

fn join(m: &Match, teams: &CollectionCache<Team>) -> MatchRow {
    let team_name = |id: &str, side: Side| {
        teams
            .get(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| side.placeholder().to_owned())
    };

    MatchRow {
        id: m.id.clone(),
        sport: m.sport.clone(),
        team_a: team_name(&m.team_a, Side::A),
        team_b: team_name(&m.team_b, Side::B),
        points_a: m.points_a,
        points_b: m.points_b,
        status: m.status,
        scheduled_at: m.scheduled_at,
        venue: m.venue.clone(),
        court_number: m.court_number.clone(),
        referee_name: m.referee_name.clone(),
    }
}

/// One big-screen region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Quadrant {
    #[default]
    Unassigned,
    Sport {
        sport_id: String,
        sport_name: String,
        live: Vec<MatchRow>,
    },
}

pub fn project_quadrants(
    layout: &LayoutConfig,
    matches: &CollectionCache<Match>,
    teams: &CollectionCache<Team>,
    sports: &CollectionCache<Sport>,
) -> [Quadrant; QUADRANTS] {
    std::array::from_fn(|idx| {
        let Some(sport_id) = layout.slot(idx) else {
            return Quadrant::Unassigned;
        };
        // Matches carry a sport name; slots carry an id. Unknown ids are
        // taken to be names already.
        let sport_name = sports
            .get(sport_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| sport_id.to_owned());
        let live = project_where(matches, teams, SortOrder::MostRecentFirst, |m| {
            m.is_live() && (m.sport.eq_ignore_ascii_case(&sport_name) || m.sport == sport_id)
        });
        Quadrant::Sport { sport_id: sport_id.to_owned(), sport_name, live }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub school: String,
    pub sport: String,
    pub gender: Gender,
}

pub fn project_teams(
    teams: &CollectionCache<Team>,
    schools: &CollectionCache<School>,
    sports: &CollectionCache<Sport>,
) -> Vec<TeamRow> {
    let mut rows: Vec<TeamRow> = teams
        .values()
        .map(|t| TeamRow {
            id: t.id.clone(),
            name: t.name.clone(),
            school: schools
                .get(&t.school)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNKNOWN_SCHOOL.to_owned()),
            sport: sports
                .get(&t.sport)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNKNOWN_SPORT.to_owned()),
            gender: t.gender,
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    rows
}

/// Sports ordered by name, for pickers.
pub fn project_sports(sports: &CollectionCache<Sport>) -> Vec<Sport> {
    let mut rows: Vec<Sport> = sports.values().cloned().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    rows
}

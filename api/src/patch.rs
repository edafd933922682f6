//! Partial records carried by change events and partial writes.
//!
//! Every field is optional: a patch only overwrites what it carries.

use crate::cache::Keyed;
use crate::{Gender, Match, MatchStatus, School, Team};
use chrono::{DateTime, Utc};

pub trait Patch {
    type Record: Keyed + Default;

    fn id(&self) -> Option<&str>;

    /// Shallow merge: overwrite the fields present in the patch.
    fn merge_into(self, record: &mut Self::Record);

    /// Build a full record, defaulting every field the patch lacks.
    fn into_record(self) -> Self::Record
    where
        Self: Sized,
    {
        let mut record = Self::Record::default();
        self.merge_into(&mut record);
        record
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPatch {
    pub id: Option<String>,
    pub sport: Option<String>,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub points_a: Option<u32>,
    pub points_b: Option<u32>,
    pub status: Option<MatchStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub court_number: Option<String>,
    pub referee_name: Option<String>,
}

impl MatchPatch {
    /// Patch touching only the score and status of one match.
    pub fn score(id: &str, points_a: u32, points_b: u32, status: MatchStatus) -> Self {
        Self {
            id: Some(id.to_owned()),
            points_a: Some(points_a),
            points_b: Some(points_b),
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<&Match> for MatchPatch {
    fn from(m: &Match) -> Self {
        Self {
            id: Some(m.id.clone()),
            sport: Some(m.sport.clone()),
            team_a: Some(m.team_a.clone()),
            team_b: Some(m.team_b.clone()),
            points_a: Some(m.points_a),
            points_b: Some(m.points_b),
            status: Some(m.status),
            scheduled_at: m.scheduled_at,
            venue: Some(m.venue.clone()),
            court_number: m.court_number.clone(),
            referee_name: m.referee_name.clone(),
        }
    }
}

impl Patch for MatchPatch {
    type Record = Match;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn merge_into(self, m: &mut Match) {
        if let Some(id) = self.id {
            m.id = id;
        }
        if let Some(sport) = self.sport {
            m.sport = sport;
        }
        if let Some(team_a) = self.team_a {
            m.team_a = team_a;
        }
        if let Some(team_b) = self.team_b {
            m.team_b = team_b;
        }
        if let Some(points_a) = self.points_a {
            m.points_a = points_a;
        }
        if let Some(points_b) = self.points_b {
            m.points_b = points_b;
        }
        if let Some(status) = self.status {
            m.status = status;
        }
        if self.scheduled_at.is_some() {
            m.scheduled_at = self.scheduled_at;
        }
        if let Some(venue) = self.venue {
            m.venue = venue;
        }
        if self.court_number.is_some() {
            m.court_number = self.court_number;
        }
        if self.referee_name.is_some() {
            m.referee_name = self.referee_name;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub school: Option<String>,
    pub sport: Option<String>,
    pub gender: Option<Gender>,
}

impl Patch for TeamPatch {
    type Record = Team;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn merge_into(self, t: &mut Team) {
        if let Some(id) = self.id {
            t.id = id;
        }
        if let Some(name) = self.name {
            t.name = name;
        }
        if let Some(school) = self.school {
            t.school = school;
        }
        if let Some(sport) = self.sport {
            t.sport = sport;
        }
        if let Some(gender) = self.gender {
            t.gender = gender;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl Patch for SchoolPatch {
    type Record = School;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn merge_into(self, s: &mut School) {
        if let Some(id) = self.id {
            s.id = id;
        }
        if let Some(name) = self.name {
            s.name = name;
        }
        if let Some(address) = self.address {
            s.address = address;
        }
    }
}

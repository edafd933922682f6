//! Decoding of websocket change-event frames.
//!
//! A frame is `{"event": <name>, "data": <payload>}`; `type` and `payload`
//! are accepted for the same keys. Decoding never touches a cache; the
//! result is handed to a live session which decides what to do with it.

use crate::LayoutConfig;
use crate::client::{match_patch_from_wire, school_patch_from_wire, team_patch_from_wire};
use crate::patch::{MatchPatch, SchoolPatch, TeamPatch};
use crate::reconcile::Change;
use crate::wire::{WireLayout, WireMatch, WireRef, WireSchool, WireTeam};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Match(Change<MatchPatch>),
    Team(Change<TeamPatch>),
    School(Change<SchoolPatch>),
    Layout(LayoutConfig),
}

impl LiveEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::Match(Change::Created(_)) => "matchCreated",
            LiveEvent::Match(Change::Updated(_)) => "matchUpdated",
            LiveEvent::Match(Change::Deleted(_)) => "matchDeleted",
            LiveEvent::Match(Change::ScoreUpdate(_)) => "scoreUpdate",
            LiveEvent::Team(Change::Created(_)) => "teamCreated",
            LiveEvent::Team(Change::Deleted(_)) => "teamDeleted",
            LiveEvent::Team(_) => "teamUpdated",
            LiveEvent::School(Change::Created(_)) => "schoolCreated",
            LiveEvent::School(Change::Deleted(_)) => "schoolDeleted",
            LiveEvent::School(_) => "schoolUpdated",
            LiveEvent::Layout(_) => "layoutUpdate",
        }
    }
}

#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    UnknownEvent(String),
    Payload { event: String, source: serde_json::Error },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(e) => write!(f, "frame is not a valid event envelope: {e}"),
            DecodeError::UnknownEvent(name) => write!(f, "unknown event {name:?}"),
            DecodeError::Payload { event, source } => write!(f, "bad {event} payload: {source}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(e) | DecodeError::Payload { source: e, .. } => Some(e),
            DecodeError::UnknownEvent(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(alias = "type")]
    event: String,
    #[serde(alias = "payload", default)]
    data: Value,
}

pub fn decode(text: &str) -> Result<LiveEvent, DecodeError> {
    let frame: Frame = serde_json::from_str(text).map_err(DecodeError::Json)?;
    let Frame { event, data } = frame;

    let decoded = match event.as_str() {
        "matchCreated" => payload::<WireMatch>(data).map(|w| LiveEvent::Match(Change::Created(match_patch_from_wire(w)))),
        "matchUpdated" => payload::<WireMatch>(data).map(|w| LiveEvent::Match(Change::Updated(match_patch_from_wire(w)))),
        "scoreUpdate" => payload::<WireMatch>(data).map(|w| LiveEvent::Match(Change::ScoreUpdate(match_patch_from_wire(w)))),
        "matchDeleted" => deleted_id(data).map(|id| LiveEvent::Match(Change::Deleted(id))),
        "teamCreated" => payload::<WireTeam>(data).map(|w| LiveEvent::Team(Change::Created(team_patch_from_wire(w)))),
        "teamUpdated" => payload::<WireTeam>(data).map(|w| LiveEvent::Team(Change::Updated(team_patch_from_wire(w)))),
        "teamDeleted" => deleted_id(data).map(|id| LiveEvent::Team(Change::Deleted(id))),
        "schoolCreated" => payload::<WireSchool>(data).map(|w| LiveEvent::School(Change::Created(school_patch_from_wire(w)))),
        "schoolUpdated" => payload::<WireSchool>(data).map(|w| LiveEvent::School(Change::Updated(school_patch_from_wire(w)))),
        "schoolDeleted" => deleted_id(data).map(|id| LiveEvent::School(Change::Deleted(id))),
        "layoutUpdate" => payload::<WireLayout>(data).map(|w| LiveEvent::Layout(LayoutConfig::from_slots(w.into_slots()))),
        _ => return Err(DecodeError::UnknownEvent(event)),
    };

    decoded.map_err(|source| DecodeError::Payload { event, source })
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data)
}

// A deleted payload is a bare id or any object carrying `id`/`_id`.
// A missing id is not a decode failure; the reconciler drops it.
fn deleted_id(data: Value) -> Result<Option<String>, serde_json::Error> {
    let r: Option<WireRef> = serde_json::from_value(data)?;
    Ok(r.as_ref().and_then(WireRef::id).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchStatus;

    #[test]
    fn score_update_decodes_partial_match() {
        let event = decode(r#"{"event": "scoreUpdate", "data": {"_id": "m1", "pointsA": 3, "status": "ongoing"}}"#).unwrap();
        let LiveEvent::Match(Change::ScoreUpdate(patch)) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(patch.id.as_deref(), Some("m1"));
        assert_eq!(patch.points_a, Some(3));
        assert_eq!(patch.points_b, None);
        assert_eq!(patch.status, Some(MatchStatus::Live));
    }

    #[test]
    fn payload_with_both_id_keys_decodes() {
        let event = decode(r#"{"event": "scoreUpdate", "data": {"_id": "m1", "id": "m1", "pointsA": 3}}"#).unwrap();
        let LiveEvent::Match(Change::ScoreUpdate(patch)) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(patch.id.as_deref(), Some("m1"));
        assert_eq!(
            decode(r#"{"event": "teamDeleted", "data": {"_id": "t1", "id": "t1"}}"#).unwrap(),
            LiveEvent::Team(Change::Deleted(Some("t1".into())))
        );
    }

    #[test]
    fn type_and_payload_aliases_are_accepted() {
        let event = decode(r#"{"type": "matchCreated", "payload": {"id": "m2", "teamA": "t1"}}"#).unwrap();
        assert_eq!(event.name(), "matchCreated");
    }

    #[test]
    fn deleted_accepts_bare_id_or_object() {
        assert_eq!(
            decode(r#"{"event": "matchDeleted", "data": "m1"}"#).unwrap(),
            LiveEvent::Match(Change::Deleted(Some("m1".into())))
        );
        assert_eq!(
            decode(r#"{"event": "teamDeleted", "data": {"_id": "t1"}}"#).unwrap(),
            LiveEvent::Team(Change::Deleted(Some("t1".into())))
        );
        assert_eq!(
            decode(r#"{"event": "schoolDeleted"}"#).unwrap(),
            LiveEvent::School(Change::Deleted(None))
        );
    }

    #[test]
    fn layout_update_is_padded_to_four() {
        let event = decode(r#"{"event": "layoutUpdate", "data": ["s1"]}"#).unwrap();
        let LiveEvent::Layout(layout) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(layout.slot(0), Some("s1"));
        assert_eq!(layout.slot(3), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode(r#"{"data": {}}"#), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode(r#"{"event": "predictionReady", "data": {}}"#),
            Err(DecodeError::UnknownEvent(name)) if name == "predictionReady"
        ));
        assert!(matches!(
            decode(r#"{"event": "scoreUpdate", "data": {"pointsA": "lots"}}"#),
            Err(DecodeError::Payload { .. })
        ));
    }

    #[test]
    fn name_round_trips_through_decode() {
        for name in ["matchCreated", "matchUpdated", "teamCreated", "teamUpdated", "schoolUpdated"] {
            let frame = format!(r#"{{"event": "{name}", "data": {{"id": "x"}}}}"#);
            assert_eq!(decode(&frame).unwrap().name(), name);
        }
    }
}

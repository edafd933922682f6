//! Gateway wire types: serde shapes for REST bodies and websocket payloads.
//! These map to the clean domain types via the functions in client.rs.
//!
//! Every field is optional because event payloads are frequently partial.
use serde::{Deserialize, Serialize};

/// A reference to another record: either a bare id or an embedded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRef {
    Id(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(rename = "_id", default, skip_serializing)]
        mongo_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

/// A record's key. Gateways send `id`, `_id` or both; a non-blank `id` wins.
pub fn record_key<'a>(id: &'a Option<String>, mongo_id: &'a Option<String>) -> Option<&'a str> {
    [id, mongo_id]
        .into_iter()
        .filter_map(|key| key.as_deref())
        .find(|key| !key.trim().is_empty())
}

/// Owned form of [`record_key`], for mapping records by value.
pub fn into_record_key(id: Option<String>, mongo_id: Option<String>) -> Option<String> {
    record_key(&id, &mongo_id).map(str::to_owned)
}

impl WireRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            WireRef::Id(id) => Some(id.as_str()),
            WireRef::Object { id, mongo_id, .. } => record_key(id, mongo_id),
        }
    }

    /// Display name when embedded, otherwise the raw reference.
    pub fn name_or_id(&self) -> Option<&str> {
        match self {
            WireRef::Id(id) => Some(id.as_str()),
            WireRef::Object { id, mongo_id, name } => name.as_deref().or(record_key(id, mongo_id)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing)]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<WireRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_a: Option<WireRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_b: Option<WireRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// ISO 8601; the gateway sometimes omits the offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_number: Option<WireScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referee_name: Option<String>,
}

/// Court numbers arrive as either strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireScalar {
    Text(String),
    Number(serde_json::Number),
}

impl WireScalar {
    pub fn into_string(self) -> String {
        match self {
            WireScalar::Text(s) => s,
            WireScalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTeam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing)]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<WireRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<WireRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSchool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing)]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing)]
    pub mongo_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing)]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// The layout arrives either as a bare slot array or wrapped in an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireLayout {
    Slots(Vec<Option<String>>),
    Wrapped {
        #[serde(alias = "layout", alias = "quadrants")]
        slots: Vec<Option<String>>,
    },
}

impl WireLayout {
    pub fn into_slots(self) -> Vec<Option<String>> {
        match self {
            WireLayout::Slots(slots) | WireLayout::Wrapped { slots } => slots,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WireLayoutUpdate<'a> {
    pub slots: &'a [Option<String>],
}

#[derive(Debug, Clone, Serialize)]
pub struct WireLogin<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireLoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_accepts_mongo_style_id_and_embedded_refs() {
        let raw = r#"{
            "_id": "m1",
            "sport": {"_id": "s1", "name": "Futsal"},
            "teamA": "t1",
            "teamB": {"id": "t2", "_id": "t2", "name": "Eagles"},
            "pointsA": 2,
            "status": "upcoming",
            "courtNumber": 3
        }"#;
        let wire: WireMatch = serde_json::from_str(raw).unwrap();
        assert_eq!(record_key(&wire.id, &wire.mongo_id), Some("m1"));
        assert_eq!(wire.sport.as_ref().and_then(WireRef::name_or_id), Some("Futsal"));
        assert_eq!(wire.team_a.as_ref().and_then(WireRef::id), Some("t1"));
        assert_eq!(wire.team_b.as_ref().and_then(WireRef::id), Some("t2"));
        assert_eq!(wire.points_b, None);
        assert_eq!(wire.court_number.map(WireScalar::into_string).as_deref(), Some("3"));
    }

    #[test]
    fn both_id_keys_on_one_record_decode() {
        let raw = r#"[{"_id": "m1", "id": "m1", "pointsA": 3}, {"_id": "m2"}, {"id": "", "_id": "m3"}]"#;
        let wires: Vec<WireMatch> = serde_json::from_str(raw).unwrap();
        let keys: Vec<_> = wires.iter().map(|w| record_key(&w.id, &w.mongo_id)).collect();
        assert_eq!(keys, vec![Some("m1"), Some("m2"), Some("m3")]);
    }

    #[test]
    fn mongo_key_is_never_written_back() {
        let wire = WireTeam { mongo_id: Some("t1".into()), name: Some("Owls".into()), ..Default::default() };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Owls"}));
    }

    #[test]
    fn partial_match_serializes_only_present_fields() {
        let wire = WireMatch { points_a: Some(1), status: Some("live".into()), ..Default::default() };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"pointsA": 1, "status": "live"}));
    }

    #[test]
    fn layout_accepts_both_shapes() {
        let bare: WireLayout = serde_json::from_str(r#"["s1", null, "s3", null]"#).unwrap();
        assert_eq!(bare.into_slots().len(), 4);
        let wrapped: WireLayout = serde_json::from_str(r#"{"layout": [null, "s2"]}"#).unwrap();
        assert_eq!(wrapped.into_slots(), vec![None, Some("s2".to_string())]);
    }
}

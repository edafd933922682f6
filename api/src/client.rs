use crate::credentials::{AuthSession, CredentialProvider, StaticCredentials};
use crate::patch::{MatchPatch, Patch, SchoolPatch, TeamPatch};
use crate::session::{Snapshot, SnapshotKinds};
use crate::validate::{self, ValidationError};
use crate::wire::{
    WireLayout, WireLayoutUpdate, WireLogin, WireLoginResponse, WireMatch, WireRef, WireSchool,
    WireScalar, WireSport, WireTeam, WireUser, into_record_key,
};
use crate::{Gender, LayoutConfig, Match, MatchStatus, Role, School, Sport, Team, User};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::try_join5;
use log::warn;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
const API_KEY_HEADER: &str = "x-api-key";

/// REST client for the event gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, Arc::new(StaticCredentials::default()))
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Unauthorized(String),
    Validation(ValidationError),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::Validation(e) => write!(f, "Invalid input: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("campus-scores/0.1 (terminal scoreboard)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            credentials,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn fetch_matches(&self) -> ApiResult<Vec<Match>> {
        let raw: Vec<WireMatch> = self.get_records("/matches").await?;
        Ok(raw.into_iter().filter_map(match_from_wire).collect())
    }

    pub async fn fetch_teams(&self) -> ApiResult<Vec<Team>> {
        let raw: Vec<WireTeam> = self.get_records("/teams").await?;
        Ok(raw.into_iter().filter_map(team_from_wire).collect())
    }

    pub async fn fetch_schools(&self) -> ApiResult<Vec<School>> {
        let raw: Vec<WireSchool> = self.get_records("/schools").await?;
        Ok(raw.into_iter().filter_map(school_from_wire).collect())
    }

    pub async fn fetch_sports(&self) -> ApiResult<Vec<Sport>> {
        let raw: Vec<WireSport> = self.get_records("/sports").await?;
        Ok(raw.into_iter().filter_map(sport_from_wire).collect())
    }

    /// List users, optionally narrowed to one role.
    pub async fn fetch_users(&self, role: Option<Role>) -> ApiResult<Vec<User>> {
        let path = match role {
            Some(role) => format!("/users?role={}", role.as_wire()),
            None => "/users".to_owned(),
        };
        let raw: Vec<WireUser> = self.get_records(&path).await?;
        Ok(raw.into_iter().filter_map(user_from_wire).collect())
    }

    pub async fn fetch_layout(&self) -> ApiResult<LayoutConfig> {
        let raw: WireLayout = self.get("/layout").await?;
        Ok(LayoutConfig::from_slots(raw.into_slots()))
    }

    /// Fetch the requested collections concurrently and join them.
    /// Fails as a whole if any single fetch fails.
    pub async fn fetch_snapshot(&self, kinds: SnapshotKinds) -> ApiResult<Snapshot> {
        let (matches, teams, schools, sports, layout) = try_join5(
            async {
                if kinds.matches { self.fetch_matches().await } else { Ok(Vec::new()) }
            },
            async {
                if kinds.teams { self.fetch_teams().await } else { Ok(Vec::new()) }
            },
            async {
                if kinds.schools { self.fetch_schools().await } else { Ok(Vec::new()) }
            },
            async {
                if kinds.sports { self.fetch_sports().await } else { Ok(Vec::new()) }
            },
            async {
                if kinds.layout { self.fetch_layout().await.map(Some) } else { Ok(None) }
            },
        )
        .await?;

        Ok(Snapshot { matches, teams, schools, sports, layout })
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Exchange a username/password for a bearer token. The caller decides
    /// where the resulting session is kept.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthSession> {
        validate::validate_user(username, password)?;
        let url = self.url("/auth/login");
        let request = self
            .with_read_key(self.client.post(&url))
            .json(&WireLogin { username, password });
        let raw: WireLoginResponse = self.execute(request, &url).await?;
        if raw.token.trim().is_empty() {
            return Err(ApiError::Unauthorized(format!("{url} returned an empty token")));
        }
        Ok(AuthSession {
            username: username.to_owned(),
            token: raw.token,
            role: raw.role.as_deref().map(Role::from_wire).unwrap_or_default(),
        })
    }

    // -----------------------------------------------------------------------
    // Writes: validated locally, then sent with the write credential
    // -----------------------------------------------------------------------

    pub async fn create_match(&self, m: &Match) -> ApiResult<Match> {
        validate::validate_match(m)?;
        let body = WireMatch { id: None, ..wire_from_match(m) };
        let raw: WireMatch = self.write(Method::POST, "/matches", Some(&body)).await?;
        match_from_wire(raw).ok_or_else(|| ApiError::Other("gateway returned a match without id".into()))
    }

    pub async fn update_match(&self, m: &Match) -> ApiResult<Match> {
        validate::validate_match(m)?;
        let path = format!("/matches/{}", require_id(&m.id)?);
        let raw: WireMatch = self.write(Method::PUT, &path, Some(&wire_from_match(m))).await?;
        Ok(match_from_wire(raw).unwrap_or_else(|| m.clone()))
    }

    /// Send only the fields carried by the patch (score changes, status flips).
    pub async fn update_match_fields(&self, patch: &MatchPatch) -> ApiResult<()> {
        validate::validate_match_patch(patch)?;
        let id = patch.id.as_deref().unwrap_or_default();
        let path = format!("/matches/{id}");
        let body = wire_from_match_patch(patch);
        self.write_unit(Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_match(&self, id: &str) -> ApiResult<()> {
        let path = format!("/matches/{}", require_id(id)?);
        self.write_unit::<()>(Method::DELETE, &path, None).await
    }

    pub async fn create_team(&self, team: &Team) -> ApiResult<Team> {
        validate::validate_team(team)?;
        let body = WireTeam { id: None, ..wire_from_team(team) };
        let raw: WireTeam = self.write(Method::POST, "/teams", Some(&body)).await?;
        team_from_wire(raw).ok_or_else(|| ApiError::Other("gateway returned a team without id".into()))
    }

    pub async fn update_team(&self, team: &Team) -> ApiResult<Team> {
        validate::validate_team(team)?;
        let path = format!("/teams/{}", require_id(&team.id)?);
        let raw: WireTeam = self.write(Method::PUT, &path, Some(&wire_from_team(team))).await?;
        Ok(team_from_wire(raw).unwrap_or_else(|| team.clone()))
    }

    pub async fn delete_team(&self, id: &str) -> ApiResult<()> {
        let path = format!("/teams/{}", require_id(id)?);
        self.write_unit::<()>(Method::DELETE, &path, None).await
    }

    pub async fn create_school(&self, school: &School) -> ApiResult<School> {
        validate::validate_school(school)?;
        let body = WireSchool { id: None, ..wire_from_school(school) };
        let raw: WireSchool = self.write(Method::POST, "/schools", Some(&body)).await?;
        school_from_wire(raw).ok_or_else(|| ApiError::Other("gateway returned a school without id".into()))
    }

    pub async fn update_school(&self, school: &School) -> ApiResult<School> {
        validate::validate_school(school)?;
        let path = format!("/schools/{}", require_id(&school.id)?);
        let raw: WireSchool = self.write(Method::PUT, &path, Some(&wire_from_school(school))).await?;
        Ok(school_from_wire(raw).unwrap_or_else(|| school.clone()))
    }

    pub async fn delete_school(&self, id: &str) -> ApiResult<()> {
        let path = format!("/schools/{}", require_id(id)?);
        self.write_unit::<()>(Method::DELETE, &path, None).await
    }

    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> ApiResult<User> {
        validate::validate_user(username, password)?;
        let body = WireUser {
            username: Some(username.to_owned()),
            password: Some(password.to_owned()),
            role: Some(role.as_wire().to_owned()),
            ..Default::default()
        };
        let raw: WireUser = self.write(Method::POST, "/users", Some(&body)).await?;
        user_from_wire(raw).ok_or_else(|| ApiError::Other("gateway returned a user without id".into()))
    }

    /// Rename a user or change their role; `password` is sent only when given.
    pub async fn update_user(&self, user: &User, password: Option<&str>) -> ApiResult<User> {
        validate::validate_user_update(user, password)?;
        let path = format!("/users/{}", user.id);
        let body = WireUser {
            username: Some(user.username.clone()),
            password: password.map(str::to_owned),
            role: Some(user.role.as_wire().to_owned()),
            ..Default::default()
        };
        let raw: WireUser = self.write(Method::PUT, &path, Some(&body)).await?;
        Ok(user_from_wire(raw).unwrap_or_else(|| user.clone()))
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let path = format!("/users/{}", require_id(id)?);
        self.write_unit::<()>(Method::DELETE, &path, None).await
    }

    pub async fn update_layout(&self, layout: &LayoutConfig) -> ApiResult<LayoutConfig> {
        let body = WireLayoutUpdate { slots: &layout.slots };
        let raw: WireLayout = self.write(Method::PUT, "/layout", Some(&body)).await?;
        Ok(LayoutConfig::from_slots(raw.into_slots()))
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn with_read_key(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.read_credential() {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        let request = self.with_read_key(self.client.get(&url));
        self.execute(request, &url).await
    }

    /// A collection where each record decodes on its own; a malformed record
    /// is skipped instead of failing the whole list.
    async fn get_records<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let raw: Vec<Value> = self.get(path).await?;
        Ok(raw
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("skipping malformed record from {path}: {e}");
                    None
                }
            })
            .collect())
    }

    fn authorized(&self, method: Method, url: &str) -> ApiResult<RequestBuilder> {
        let token = self
            .credentials
            .write_credential()
            .ok_or_else(|| ApiError::Unauthorized(format!("{method} {url} requires a login")))?;
        Ok(self.with_read_key(self.client.request(method, url)).bearer_auth(token))
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.authorized(method, &url)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, &url).await
    }

    async fn write_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut request = self.authorized(method, &url)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, &url).await.map(|_| ())
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> ApiResult<T> {
        let response = self.send(request, url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> ApiResult<Response> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(url.to_owned())),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(ApiError::Unauthorized(format!("{url} rejected the credential ({status})")))
            }
            _ => response
                .error_for_status()
                .map_err(|e| ApiError::Api(e, url.to_owned())),
        }
    }
}

fn require_id(id: &str) -> ApiResult<&str> {
    if id.trim().is_empty() {
        return Err(ApiError::Validation(ValidationError::MissingId));
    }
    Ok(id)
}

// ---------------------------------------------------------------------------
// Mapping: gateway wire types → clean domain types
// ---------------------------------------------------------------------------

/// Accepts RFC 3339 and the offset-less forms the gateway emits; the latter
/// are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn ref_id(r: Option<WireRef>) -> Option<String> {
    r.as_ref().and_then(WireRef::id).map(str::to_owned)
}

pub(crate) fn match_patch_from_wire(w: WireMatch) -> MatchPatch {
    MatchPatch {
        id: into_record_key(w.id, w.mongo_id),
        sport: w.sport.as_ref().and_then(WireRef::name_or_id).map(str::to_owned),
        team_a: ref_id(w.team_a),
        team_b: ref_id(w.team_b),
        points_a: w.points_a,
        points_b: w.points_b,
        status: w.status.as_deref().map(MatchStatus::from_wire),
        scheduled_at: w.scheduled_at.as_deref().and_then(parse_timestamp),
        venue: w.venue,
        court_number: w.court_number.map(WireScalar::into_string),
        referee_name: w.referee_name,
    }
}

fn match_from_wire(w: WireMatch) -> Option<Match> {
    let patch = match_patch_from_wire(w);
    patch.id.as_deref().filter(|id| !id.trim().is_empty())?;
    Some(patch.into_record())
}

pub(crate) fn team_patch_from_wire(w: WireTeam) -> TeamPatch {
    TeamPatch {
        id: into_record_key(w.id, w.mongo_id),
        name: w.name,
        school: ref_id(w.school),
        sport: ref_id(w.sport),
        gender: w.gender.as_deref().and_then(Gender::from_wire),
    }
}

fn team_from_wire(w: WireTeam) -> Option<Team> {
    let patch = team_patch_from_wire(w);
    patch.id.as_deref().filter(|id| !id.trim().is_empty())?;
    Some(patch.into_record())
}

pub(crate) fn school_patch_from_wire(w: WireSchool) -> SchoolPatch {
    SchoolPatch { id: into_record_key(w.id, w.mongo_id), name: w.name, address: w.address }
}

fn school_from_wire(w: WireSchool) -> Option<School> {
    let patch = school_patch_from_wire(w);
    patch.id.as_deref().filter(|id| !id.trim().is_empty())?;
    Some(patch.into_record())
}

fn sport_from_wire(w: WireSport) -> Option<Sport> {
    let id = into_record_key(w.id, w.mongo_id)?;
    Some(Sport { name: w.name.unwrap_or_else(|| id.clone()), id })
}

fn user_from_wire(w: WireUser) -> Option<User> {
    let id = into_record_key(w.id, w.mongo_id)?;
    Some(User {
        id,
        username: w.username.unwrap_or_default(),
        role: w.role.as_deref().map(Role::from_wire).unwrap_or_default(),
        api_key: w.api_key,
    })
}

// ---------------------------------------------------------------------------
// Mapping: domain types → gateway wire types
// ---------------------------------------------------------------------------

fn wire_from_match(m: &Match) -> WireMatch {
    wire_from_match_patch(&MatchPatch::from(m))
}

fn wire_from_match_patch(p: &MatchPatch) -> WireMatch {
    WireMatch {
        id: p.id.clone(),
        mongo_id: None,
        sport: p.sport.clone().map(WireRef::Id),
        team_a: p.team_a.clone().map(WireRef::Id),
        team_b: p.team_b.clone().map(WireRef::Id),
        points_a: p.points_a,
        points_b: p.points_b,
        status: p.status.map(|s| s.as_wire().to_owned()),
        scheduled_at: p.scheduled_at.map(|t| t.to_rfc3339()),
        venue: p.venue.clone(),
        court_number: p.court_number.clone().map(WireScalar::Text),
        referee_name: p.referee_name.clone(),
    }
}

fn wire_from_team(t: &Team) -> WireTeam {
    WireTeam {
        id: Some(t.id.clone()),
        name: Some(t.name.clone()),
        school: Some(WireRef::Id(t.school.clone())),
        sport: Some(WireRef::Id(t.sport.clone())),
        gender: Some(t.gender.as_wire().to_owned()),
        ..Default::default()
    }
}

fn wire_from_school(s: &School) -> WireSchool {
    WireSchool {
        id: Some(s.id.clone()),
        name: Some(s.name.clone()),
        address: Some(s.address.clone()),
        ..Default::default()
    }
}

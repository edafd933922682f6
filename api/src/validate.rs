//! Checks run before a write is sent. A failing check never reaches the gateway.

use crate::patch::MatchPatch;
use crate::{Match, School, Side, Team, User};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingTeam(Side),
    DuplicateTeam(String),
    Blank(&'static str),
    MissingId,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingTeam(side) => write!(f, "{} is not set", side.placeholder()),
            ValidationError::DuplicateTeam(id) => {
                write!(f, "a match cannot put team {id} against itself")
            }
            ValidationError::Blank(field) => write!(f, "{field} must not be blank"),
            ValidationError::MissingId => write!(f, "record id is required for this operation"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_match(m: &Match) -> ValidationResult {
    if m.team_a.trim().is_empty() {
        return Err(ValidationError::MissingTeam(Side::A));
    }
    if m.team_b.trim().is_empty() {
        return Err(ValidationError::MissingTeam(Side::B));
    }
    if m.team_a == m.team_b {
        return Err(ValidationError::DuplicateTeam(m.team_a.clone()));
    }
    if m.sport.trim().is_empty() {
        return Err(ValidationError::Blank("sport"));
    }
    Ok(())
}

/// Partial writes are checked only on the fields they carry.
pub fn validate_match_patch(patch: &MatchPatch) -> ValidationResult {
    if patch.id.as_deref().is_none_or(|id| id.trim().is_empty()) {
        return Err(ValidationError::MissingId);
    }
    if let (Some(a), Some(b)) = (&patch.team_a, &patch.team_b)
        && a == b
    {
        return Err(ValidationError::DuplicateTeam(a.clone()));
    }
    if patch.sport.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(ValidationError::Blank("sport"));
    }
    Ok(())
}

pub fn validate_team(team: &Team) -> ValidationResult {
    if team.name.trim().is_empty() {
        return Err(ValidationError::Blank("team name"));
    }
    if team.school.trim().is_empty() {
        return Err(ValidationError::Blank("school"));
    }
    if team.sport.trim().is_empty() {
        return Err(ValidationError::Blank("sport"));
    }
    Ok(())
}

pub fn validate_school(school: &School) -> ValidationResult {
    if school.name.trim().is_empty() {
        return Err(ValidationError::Blank("school name"));
    }
    Ok(())
}

pub fn validate_user(username: &str, password: &str) -> ValidationResult {
    if username.trim().is_empty() {
        return Err(ValidationError::Blank("username"));
    }
    if password.is_empty() {
        return Err(ValidationError::Blank("password"));
    }
    Ok(())
}

/// A password is only checked when the update changes it.
pub fn validate_user_update(user: &User, password: Option<&str>) -> ValidationResult {
    if user.id.trim().is_empty() {
        return Err(ValidationError::MissingId);
    }
    if user.username.trim().is_empty() {
        return Err(ValidationError::Blank("username"));
    }
    if password.is_some_and(str::is_empty) {
        return Err(ValidationError::Blank("password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Match {
        Match {
            id: "m1".into(),
            sport: "Futsal".into(),
            team_a: "t1".into(),
            team_b: "t2".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_match_passes() {
        assert_eq!(validate_match(&fixture()), Ok(()));
    }

    #[test]
    fn same_team_twice_is_rejected() {
        let m = Match { team_b: "t1".into(), ..fixture() };
        assert_eq!(validate_match(&m), Err(ValidationError::DuplicateTeam("t1".into())));
    }

    #[test]
    fn missing_team_is_rejected() {
        let m = Match { team_a: String::new(), ..fixture() };
        assert_eq!(validate_match(&m), Err(ValidationError::MissingTeam(Side::A)));
    }

    #[test]
    fn score_patch_only_needs_an_id() {
        let patch = MatchPatch { id: Some("m1".into()), points_a: Some(3), ..Default::default() };
        assert_eq!(validate_match_patch(&patch), Ok(()));
        assert_eq!(validate_match_patch(&MatchPatch::default()), Err(ValidationError::MissingId));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_school(&School::default()).is_err());
        assert!(validate_user("  ", "pw").is_err());
        assert!(validate_team(&Team { name: "Owls".into(), ..Default::default() }).is_err());
    }

    #[test]
    fn user_update_keeps_password_optional() {
        let user = User { id: "u1".into(), username: "ana".into(), ..Default::default() };
        assert_eq!(validate_user_update(&user, None), Ok(()));
        assert_eq!(validate_user_update(&user, Some("")), Err(ValidationError::Blank("password")));
        let nameless = User { username: " ".into(), ..user.clone() };
        assert_eq!(validate_user_update(&nameless, None), Err(ValidationError::Blank("username")));
        let unsaved = User { id: String::new(), ..user };
        assert_eq!(validate_user_update(&unsaved, Some("pw")), Err(ValidationError::MissingId));
    }
}

//! Credential providers consulted by the gateway client.
//!
//! The client never decides where credentials live; it asks a provider for a
//! read key and a write token on every request.

use crate::Role;
use std::fmt;
use std::sync::RwLock;

pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Shared key attached to reads, if the gateway wants one.
    fn read_credential(&self) -> Option<String>;

    /// Bearer token attached to writes. Writes are refused without one.
    fn write_credential(&self) -> Option<String>;
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub username: String,
    pub token: String,
    pub role: Role,
}

/// Fixed credentials, typically from the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    pub api_key: Option<String>,
    pub token: Option<String>,
}

impl CredentialProvider for StaticCredentials {
    fn read_credential(&self) -> Option<String> {
        self.api_key.clone()
    }

    fn write_credential(&self) -> Option<String> {
        self.token.clone()
    }
}

/// In-memory credentials filled in by a login at runtime. A pre-issued token
/// serves as the write credential until a login replaces it.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    api_key: Option<String>,
    fallback_token: Option<String>,
    session: RwLock<Option<AuthSession>>,
}

impl SessionCredentials {
    pub fn new(api_key: Option<String>, fallback_token: Option<String>) -> Self {
        Self { api_key, fallback_token, session: RwLock::new(None) }
    }

    pub fn store(&self, session: AuthSession) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(session);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.session.write() {
            *guard = None;
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }
}

impl CredentialProvider for SessionCredentials {
    fn read_credential(&self) -> Option<String> {
        self.api_key.clone()
    }

    fn write_credential(&self) -> Option<String> {
        self.current()
            .map(|s| s.token)
            .or_else(|| self.fallback_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_token_overrides_fallback() {
        let creds = SessionCredentials::new(Some("shared".into()), Some("preissued".into()));
        assert_eq!(creds.write_credential().as_deref(), Some("preissued"));

        creds.store(AuthSession { username: "ana".into(), token: "fresh".into(), role: Role::Scorekeeper });
        assert_eq!(creds.write_credential().as_deref(), Some("fresh"));
        assert_eq!(creds.read_credential().as_deref(), Some("shared"));

        creds.clear();
        assert_eq!(creds.write_credential().as_deref(), Some("preissued"));
    }

    #[test]
    fn no_credentials_means_no_writes() {
        let creds = StaticCredentials::default();
        assert!(creds.write_credential().is_none());
        assert!(creds.read_credential().is_none());
    }
}

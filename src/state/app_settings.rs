use log::LevelFilter;
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8788";
pub const DEFAULT_WS_RETRIES: u32 = 5;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub api_url: String,
    pub ws_url: String,
    /// Shared read key sent with every GET.
    pub api_key: Option<String>,
    /// Pre-issued bearer token; a login replaces it.
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ws_retries: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            api_key: None,
            token: None,
            username: None,
            password: None,
            ws_retries: DEFAULT_WS_RETRIES,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            full_screen: false,
            log_level: var("CAMPUS_LOG").and_then(|v| LevelFilter::from_str(&v).ok()),
            api_url: var("CAMPUS_API_URL").unwrap_or(defaults.api_url),
            ws_url: var("CAMPUS_WS_URL").unwrap_or(defaults.ws_url),
            api_key: var("CAMPUS_API_KEY"),
            token: var("CAMPUS_TOKEN"),
            username: var("CAMPUS_USERNAME"),
            password: var("CAMPUS_PASSWORD"),
            ws_retries: var("CAMPUS_WS_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ws_retries),
        }
    }

    /// Username and password, when both are configured.
    pub fn login(&self) -> Option<(String, String)> {
        Some((self.username.clone()?, self.password.clone()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> AppSettings {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.ws_url, DEFAULT_WS_URL);
        assert_eq!(s.ws_retries, DEFAULT_WS_RETRIES);
        assert!(s.token.is_none());
        assert!(s.login().is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let s = settings(&[
            ("CAMPUS_API_URL", "https://scores.example.edu/api"),
            ("CAMPUS_WS_RETRIES", "2"),
            ("CAMPUS_LOG", "debug"),
            ("CAMPUS_USERNAME", "ana"),
            ("CAMPUS_PASSWORD", "pw"),
        ]);
        assert_eq!(s.api_url, "https://scores.example.edu/api");
        assert_eq!(s.ws_retries, 2);
        assert_eq!(s.log_level, Some(LevelFilter::Debug));
        assert_eq!(s.login(), Some(("ana".to_string(), "pw".to_string())));
    }

    #[test]
    fn blank_and_garbage_values_fall_back() {
        let s = settings(&[("CAMPUS_TOKEN", "  "), ("CAMPUS_WS_RETRIES", "many"), ("CAMPUS_LOG", "loud")]);
        assert!(s.token.is_none());
        assert_eq!(s.ws_retries, DEFAULT_WS_RETRIES);
        assert!(s.log_level.is_none());
    }
}

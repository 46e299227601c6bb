//! Startup configuration, read once from the environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct HostConfig {
    pub api_url: String,
    pub base_id: String,
    pub table_name: String,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HostConfig {
    /// Read `AIRTABLE_BASE_ID`, `AIRTABLE_TABLE_NAME` and `AIRTABLE_PAT`,
    /// plus the optional `AIRTABLE_API_URL` and `TODO_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let timeout = match lookup("TODO_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    name: "TODO_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: lookup("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            base_id: required("AIRTABLE_BASE_ID")?,
            table_name: required("AIRTABLE_TABLE_NAME")?,
            token: required("AIRTABLE_PAT")?,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("AIRTABLE_BASE_ID", "appXYZ"),
        ("AIRTABLE_TABLE_NAME", "Todos"),
        ("AIRTABLE_PAT", "patSecret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = HostConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.base_id, "appXYZ");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = HostConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AIRTABLE_PAT"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let err = HostConfig::from_lookup(lookup(&[
            ("AIRTABLE_BASE_ID", " "),
            ("AIRTABLE_TABLE_NAME", "Todos"),
            ("AIRTABLE_PAT", "p"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("AIRTABLE_BASE_ID"));
    }

    #[test]
    fn overrides_apply() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AIRTABLE_API_URL", "http://127.0.0.1:3000/v0"));
        pairs.push(("TODO_HTTP_TIMEOUT_SECS", "5"));
        let config = HostConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:3000/v0");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn unparsable_timeout_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TODO_HTTP_TIMEOUT_SECS", "soon"));
        let err = HostConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "TODO_HTTP_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn debug_hides_token() {
        let config = HostConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert!(!format!("{config:?}").contains("patSecret"));
    }
}

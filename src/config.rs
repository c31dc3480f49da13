use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const API_URL_VAR: &str = "EURI_API_URL";
pub const API_KEY_VAR: &str = "EURI_API_KEY";

const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_INTERACTION_LOG_PATH: &str = "interaction_log.txt";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_CORS_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://ask-me-tawny.vercel.app",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; add it to the environment or a .env file")]
    Missing(&'static str),
    #[error("{var} must be an http:// or https:// URL, got '{value}'")]
    InvalidUrl { var: &'static str, value: String },
    #[error("BIND_ADDR must be a socket address such as 127.0.0.1:8000, got '{0}'")]
    InvalidBindAddr(String),
}

#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub request_timeout_secs: u64,
    pub interaction_log_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("interaction_log_path", &self.interaction_log_path)
            .field("bind_addr", &self.bind_addr)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Required values are checked here so a misconfigured process fails at
    /// startup instead of on its first outbound request.
    pub fn from_vars(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(get_var(API_URL_VAR).as_deref())?;
        let api_key = parse_required(API_KEY_VAR, get_var(API_KEY_VAR).as_deref())?;
        let bind_addr = parse_bind_addr(get_var("BIND_ADDR").as_deref())?;

        Ok(Self {
            api_url,
            api_key,
            model: parse_non_empty(get_var("MODEL").as_deref(), DEFAULT_MODEL),
            system_prompt: parse_non_empty(
                get_var("SYSTEM_PROMPT").as_deref(),
                DEFAULT_SYSTEM_PROMPT,
            ),
            request_timeout_secs: parse_request_timeout_secs(
                get_var("REQUEST_TIMEOUT_SECS").as_deref(),
            ),
            interaction_log_path: PathBuf::from(parse_non_empty(
                get_var("INTERACTION_LOG_PATH").as_deref(),
                DEFAULT_INTERACTION_LOG_PATH,
            )),
            bind_addr,
            cors_allowed_origins: parse_origins(get_var("CORS_ALLOWED_ORIGINS").as_deref()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_required(var: &'static str, raw: Option<&str>) -> Result<String, ConfigError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(var))
}

fn parse_api_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = parse_required(API_URL_VAR, raw)?;
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl {
            var: API_URL_VAR,
            value: url,
        });
    }
    Ok(url)
}

fn parse_non_empty(raw: Option<&str>, default: &str) -> String {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn parse_request_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn parse_bind_addr(raw: Option<&str>) -> Result<SocketAddr, ConfigError> {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_BIND_ADDR);
    value
        .parse()
        .map_err(|_| ConfigError::InvalidBindAddr(value.to_string()))
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        DEFAULT_CORS_ALLOWED_ORIGINS
            .iter()
            .map(|origin| (*origin).to_string())
            .collect()
    } else {
        parsed
    }
}

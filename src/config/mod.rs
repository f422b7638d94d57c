use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use crate::cli::Args;

pub const DEFAULT_GREETING: &str = "Hi! I'm Simsim 😊 What shall we talk about?";
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, something went wrong.";
pub const SUMMARY_TITLE_CHARS: usize = 30;

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl(url::ParseError),
    UnsupportedScheme(String),
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl(e) => write!(f, "Invalid server URL: {}", e),
            ConfigError::UnsupportedScheme(s) => write!(f, "Server URL must be http or https, got '{}'", s),
            ConfigError::InvalidTimeout => write!(f, "Request timeout must be greater than 0"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::InvalidUrl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        ConfigError::InvalidUrl(err)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub request_timeout: Duration,
    pub storage_type: String,
    pub storage_path: PathBuf,
    pub greeting: String,
    pub fallback_reply: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse("http://127.0.0.1:5000/").expect("static URL is valid"),
            request_timeout: Duration::from_secs(30),
            storage_type: "file".to_string(),
            storage_path: PathBuf::from(".chatbot/local_storage.json"),
            greeting: DEFAULT_GREETING.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let server_url = parse_server_url(&args.server_url)?;
        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            server_url,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            storage_type: args.storage_type.clone(),
            storage_path: PathBuf::from(&args.storage_path),
            greeting: args.greeting
                .clone()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            fallback_reply: args.fallback_reply
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
        })
    }
}

/// Endpoint paths are joined onto this URL, so it always ends in '/'.
pub fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::UnsupportedScheme(other.to_string()));
        }
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

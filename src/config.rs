// src/config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the analysis backend, without a trailing slash
    pub api_base_url: String,

    /// Google OAuth client id; `None` disables Google sign-in
    pub google_client_id: Option<String>,

    /// Directory holding the persisted access token
    pub token_dir: PathBuf,

    /// Delay between status polls while a job is processing
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            google_client_id: None,
            token_dir: default_token_dir(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - SCENE_SPEAK_API_URL: backend base URL (default: http://localhost:8000)
    /// - GOOGLE_CLIENT_ID: enables Google sign-in when set
    /// - SCENE_SPEAK_TOKEN_DIR: where the access token is stored (default: ~/.scene_speak)
    /// - SCENE_SPEAK_POLL_INTERVAL_MS: status poll interval (default: 2000)
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let api_base_url = env::var("SCENE_SPEAK_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty());
        if google_client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set. Google sign-in will be disabled.");
        }

        let token_dir = env::var("SCENE_SPEAK_TOKEN_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_dir);

        let poll_interval = parse_poll_interval(env::var("SCENE_SPEAK_POLL_INTERVAL_MS").ok().as_deref());

        Config {
            api_base_url,
            google_client_id,
            token_dir,
            poll_interval,
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_base_url(url);
        self
    }

    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval = parse_poll_interval(Some(&millis.to_string()));
        self
    }

    pub fn google_sign_in_enabled(&self) -> bool {
        self.google_client_id.is_some()
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_poll_interval(raw: Option<&str>) -> Duration {
    let millis = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    Duration::from_millis(millis)
}

fn default_token_dir() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scene_speak")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(normalize_base_url("http://api.example.com/ "), "http://api.example.com");
        assert_eq!(normalize_base_url("http://api.example.com//"), "http://api.example.com");
    }

    #[test]
    fn bad_poll_intervals_fall_back_to_default() {
        assert_eq!(parse_poll_interval(None), Duration::from_millis(2000));
        assert_eq!(parse_poll_interval(Some("0")), Duration::from_millis(2000));
        assert_eq!(parse_poll_interval(Some("soon")), Duration::from_millis(2000));
        assert_eq!(parse_poll_interval(Some("250")), Duration::from_millis(250));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = Config::default()
            .with_api_url("https://scene.example/")
            .with_poll_interval_ms(500);
        assert_eq!(config.api_base_url, "https://scene.example");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(!config.google_sign_in_enabled());
    }
}

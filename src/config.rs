//! Client configuration from environment variables and CLI flags

use crate::error::{ClientError, ClientResult};
use std::time::Duration;
use url::Url;

pub const DEFAULT_SERVER: &str = "http://localhost:4200";
const DEFAULT_PORT: u16 = 4200;

/// How long a wrong guess stays on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Fully visible
    pub display: Duration,
    /// Fading out, removed afterwards
    pub fade: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            display: Duration::from_millis(3000),
            fade: Duration::from_millis(1000),
        }
    }
}

/// Validated server origin, e.g. `http://192.168.0.10:4200`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    origin: Url,
}

impl ServerAddress {
    /// Accepts `host`, `host:port` or a full http(s)/ws(s) URL.
    /// Bare hosts get port 4200.
    pub fn parse(input: &str) -> ClientResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ClientError::InvalidAddress("empty address".to_string()));
        }

        let has_scheme = input.contains("://");
        let raw = if has_scheme {
            input.to_string()
        } else {
            format!("http://{}", input)
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| ClientError::InvalidAddress(format!("{}: {}", input, e)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "http",
            "https" | "wss" => "https",
            other => {
                return Err(ClientError::InvalidAddress(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidAddress(input.to_string()))?;

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ClientError::InvalidAddress(format!("{}: missing host", input)));
        }

        if !has_scheme && url.port().is_none() {
            url.set_port(Some(DEFAULT_PORT))
                .map_err(|_| ClientError::InvalidAddress(input.to_string()))?;
        }

        url.set_path("");
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { origin: url })
    }

    /// Origin without trailing slash
    pub fn origin(&self) -> &str {
        self.origin.as_str().trim_end_matches('/')
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin(), path.trim_start_matches('/'))
    }

    /// `ws://host:port/ws/[<game_id>/]<username>`
    pub fn ws_url(&self, username: &str, game_id: Option<&str>) -> ClientResult<Url> {
        let mut url = self.origin.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidAddress(self.origin().to_string()))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidAddress(self.origin().to_string()))?;
            segments.clear().push("ws");
            if let Some(game_id) = game_id {
                segments.push(game_id);
            }
            segments.push(username);
        }

        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: ServerAddress,
    pub username: Option<String>,
    /// Game session to join. Without one the legacy single-game path is used.
    pub game_id: Option<String>,
    pub timing: TimingConfig,
    /// Start the game automatically when the server says we joined first
    pub auto_start: bool,
    /// Leave after this many guesses
    pub max_turns: Option<u32>,
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Load config from environment variables
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key).and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };
        let millis = |key: &str, default: Duration| match var(key) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!("Ignoring invalid {}={:?}, using {:?}", key, raw, default);
                    default
                }
            },
            None => default,
        };

        let server = ServerAddress::parse(
            var("TRACKBACK_SERVER")
                .as_deref()
                .unwrap_or(DEFAULT_SERVER),
        )?;

        let defaults = TimingConfig::default();
        let timing = TimingConfig {
            display: millis("TRACKBACK_DISPLAY_MS", defaults.display),
            fade: millis("TRACKBACK_FADE_MS", defaults.fade),
        };

        let auto_start = var("TRACKBACK_AUTO_START")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let http_timeout = var("TRACKBACK_HTTP_TIMEOUT")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Ok(Self {
            server,
            username: var("TRACKBACK_USERNAME"),
            game_id: var("TRACKBACK_GAME_ID"),
            timing,
            auto_start,
            max_turns: None,
            http_timeout,
        })
    }

    /// Username to connect with, rejecting blank names
    pub fn require_username(&self) -> ClientResult<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClientError::Config("a username is required".to_string()))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerAddress {
                origin: Url::parse(DEFAULT_SERVER).expect("default server address is valid"),
            },
            username: None,
            game_id: None,
            timing: TimingConfig::default(),
            auto_start: false,
            max_turns: None,
            http_timeout: Duration::from_secs(10),
        }
    }
}

use crate::constants::{
    CHAT_PATH, DEFAULT_SERVER_URL, DEFAULT_USERNAME, RECONNECT_DELAY_MS, REVEAL_DELAY_MS,
    TOKEN_PATH, TOKEN_TIMEOUT_MS, USERNAME_QUERY_KEY,
};
use crate::errors::{FinchatError, FinchatResult};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, str::FromStr, time::Duration};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat service; the token issuer lives at `<server_url>/token`.
    pub server_url: String,
    /// Explicit WebSocket endpoint. Derived from `server_url` when absent.
    pub chat_url: Option<String>,
    pub username: String,
    pub reconnect_delay_ms: u64,
    pub reveal_delay_ms: u64,
    /// Upper bound on the credential request; a hung token endpoint fails the session.
    pub token_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            chat_url: None,
            username: DEFAULT_USERNAME.to_string(),
            reconnect_delay_ms: RECONNECT_DELAY_MS,
            reveal_delay_ms: REVEAL_DELAY_MS,
            token_timeout_ms: TOKEN_TIMEOUT_MS,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Loads `~/.config/finchat/config.json` if it exists, otherwise returns the defaults.
    /// The file is never written.
    pub fn load() -> FinchatResult<Self> {
        let config_path = get_config_path()?;
        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }

    pub fn from_file(path: &Path) -> FinchatResult<Self> {
        let config_str = fs::read_to_string(path).map_err(|e| {
            FinchatError::config_error(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| FinchatError::config_error(format!("Failed to parse config: {}", e)))?;

        validate_config(&config)?;
        Ok(config)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }

    pub fn level_filter(&self) -> FinchatResult<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| {
            FinchatError::config_error(format!("Unknown log level '{}'", self.log_level))
        })
    }

    /// `POST` target of the credential request, e.g. `http://localhost:5000/token?username=testuser`.
    pub fn token_url(&self) -> FinchatResult<Url> {
        let mut url = Url::parse(&self.server_url)?;
        push_segment(&mut url, TOKEN_PATH)?;
        url.query_pairs_mut()
            .clear()
            .append_pair(USERNAME_QUERY_KEY, &self.username);
        Ok(url)
    }

    /// Chat endpoint without the credential attached.
    pub fn chat_url(&self) -> FinchatResult<Url> {
        if let Some(explicit) = &self.chat_url {
            return Ok(Url::parse(explicit)?);
        }

        let mut url = Url::parse(&self.server_url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|_| {
            FinchatError::config_error(format!("Cannot derive a chat URL from '{}'", self.server_url))
        })?;
        push_segment(&mut url, CHAT_PATH)?;
        url.set_query(None);
        Ok(url)
    }
}

fn push_segment(url: &mut Url, segment: &str) -> FinchatResult<()> {
    let shown = url.to_string();
    url.path_segments_mut()
        .map_err(|_| FinchatError::config_error(format!("'{}' cannot be a base URL", shown)))?
        .pop_if_empty()
        .push(segment);
    Ok(())
}

fn get_config_path() -> FinchatResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| FinchatError::config_error("Could not determine home directory"))?;

    Ok(home_dir.join(".config").join("finchat").join("config.json"))
}

fn validate_config(config: &Config) -> FinchatResult<()> {
    if config.username.trim().is_empty() {
        return Err(FinchatError::config_error("username is required"));
    }

    let server = Url::parse(&config.server_url).map_err(|e| {
        FinchatError::config_error(format!("Invalid server_url '{}': {}", config.server_url, e))
    })?;
    if !matches!(server.scheme(), "http" | "https") {
        return Err(FinchatError::config_error(format!(
            "server_url must use http or https, got '{}'",
            server.scheme()
        )));
    }

    if let Some(chat_url) = &config.chat_url {
        let chat = Url::parse(chat_url).map_err(|e| {
            FinchatError::config_error(format!("Invalid chat_url '{}': {}", chat_url, e))
        })?;
        if !matches!(chat.scheme(), "ws" | "wss") {
            return Err(FinchatError::config_error(format!(
                "chat_url must use ws or wss, got '{}'",
                chat.scheme()
            )));
        }
    }

    if config.reconnect_delay_ms == 0 {
        return Err(FinchatError::config_error(
            "reconnect_delay_ms must be greater than 0",
        ));
    }

    if config.reveal_delay_ms == 0 {
        return Err(FinchatError::config_error("reveal_delay_ms must be greater than 0"));
    }

    if config.token_timeout_ms == 0 {
        return Err(FinchatError::config_error("token_timeout_ms must be greater than 0"));
    }

    config.level_filter()?;

    Ok(())
}

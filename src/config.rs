//! Runtime configuration, read from the environment (and `.env` via `dotenv`).
//!
//! Every setting is resolved once at startup and handed to the components that
//! need it; nothing reads the environment after [`Config::from_env`] returns.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::utils::chunker::DEFAULT_CHUNK_LIMIT;

/// Errors raised while loading the configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the IRC network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcConfig {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub password: Option<String>,
    pub channels: Vec<String>,
    /// Prefix that marks a channel message as a command (e.g. `!stock`).
    pub command_prefix: String,
}

/// Settings for the OpenAI completion and chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub chat_model: String,
    pub completion_model: String,
}

/// Settings for the quote commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StocksConfig {
    pub yahoo_base_url: String,
    pub alphavantage_api_key: Option<String>,
    pub alphavantage_base_url: String,
    /// Upper bound on symbols accepted by a single `stock`/`crypto` call.
    pub max_symbols: usize,
    /// Fiat currency appended to crypto symbols (`BTC` becomes `BTC-USD`).
    pub crypto_fiat: String,
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub irc: IrcConfig,
    pub openai: OpenAiConfig,
    pub stocks: StocksConfig,
    /// Maximum characters per reply line.
    pub chunk_limit: usize,
    pub http_timeout: Duration,
}

impl Config {
    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server = get("IRC_SERVER").ok_or(ConfigError::Missing("IRC_SERVER"))?;
        let nick = get("IRC_NICK").unwrap_or_else(|| "ircquote".to_string());

        let irc = IrcConfig {
            server,
            port: parse_or(&get, "IRC_PORT", 6667)?,
            username: get("IRC_USERNAME").unwrap_or_else(|| nick.clone()),
            realname: get("IRC_REALNAME").unwrap_or_else(|| nick.clone()),
            nick,
            password: get("IRC_PASSWORD"),
            channels: get("IRC_CHANNELS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
        };

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            max_tokens: parse_or(&get, "OPENAI_MAX_TOKENS", 256)?,
            chat_model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            completion_model: get("OPENAI_COMPLETION_MODEL")
                .unwrap_or_else(|| "text-davinci-003".to_string()),
        };

        let stocks = StocksConfig {
            yahoo_base_url: get("YAHOO_BASE_URL")
                .unwrap_or_else(|| "https://query2.finance.yahoo.com".to_string()),
            alphavantage_api_key: get("ALPHAVANTAGE_API_KEY"),
            alphavantage_base_url: get("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| "https://www.alphavantage.co".to_string()),
            max_symbols: parse_or(&get, "STOCKS_MAX_SYMBOLS", 5)?,
            crypto_fiat: get("STOCKS_CRYPTO_FIAT")
                .map(|f| f.to_ascii_uppercase())
                .unwrap_or_else(|| "USD".to_string()),
        };

        let chunk_limit = parse_or(&get, "CHUNK_LIMIT", DEFAULT_CHUNK_LIMIT)?;
        if chunk_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_LIMIT",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let http_timeout = Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 30)?);

        debug!(
            server = %irc.server,
            port = irc.port,
            nick = %irc.nick,
            chunk_limit,
            "Configuration loaded"
        );

        Ok(Self {
            irc,
            openai,
            stocks,
            chunk_limit,
            http_timeout,
        })
    }
}

/// Parses `key` when present, falling back to `default` when unset.
fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

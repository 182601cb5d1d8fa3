//! IRC bot answering chat-completion and market-quote commands.

pub mod commands;
pub mod config;
pub mod irc;
pub mod utils;

use std::sync::Arc;

use config::Config;
use irc::reply::Replier;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type CommandResult = Result<(), Error>;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; ",
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// State shared by every command invocation.
pub struct Data {
    pub config: Config,
    /// One pooled HTTP client for all upstream APIs.
    pub http: reqwest::Client,
}

impl Data {
    /// Builds the shared state, including the HTTP client.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, http })
    }
}

/// Everything a command needs: shared state and where to reply.
#[derive(Clone)]
pub struct Context {
    pub data: Arc<Data>,
    pub replier: Replier,
}

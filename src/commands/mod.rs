//! This module aggregates all the command modules for the bot.

/// Commands backed by the OpenAI completion and chat APIs.
pub mod ai;
/// General purpose commands (e.g., help).
pub mod general;
/// Market quote commands (Yahoo Finance, AlphaVantage).
pub mod stocks;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{CommandResult, Context};

/// Errors raised by command argument handling, before any upstream call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Arguments are missing or malformed.
    #[error("Usage: {name} {usage}")]
    Usage {
        name: &'static str,
        usage: &'static str,
    },

    /// An argument failed validation.
    #[error("'{value}' is not a valid {kind}.")]
    InvalidArgument { kind: &'static str, value: String },

    /// More symbols than the configured maximum were requested.
    #[error("Too many symbols. Maximum count {max}. Your count: {count}")]
    TooManySymbols { max: usize, count: usize },

    /// A credential the command depends on has not been configured.
    #[error("Missing API key, ask the admin to get one and set {setting}")]
    MissingApiKey { setting: &'static str },
}

/// Name, usage and description of a command, shown by `help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

impl CommandInfo {
    /// The usage error for this command.
    pub fn usage_error(&self) -> CommandError {
        CommandError::Usage {
            name: self.name,
            usage: self.usage,
        }
    }
}

/// Every command the bot answers to.
pub const COMMANDS: &[CommandInfo] = &[
    ai::chatgpt::INFO,
    ai::gpt3::INFO,
    stocks::stock::STOCK_INFO,
    stocks::stock::CRYPTO_INFO,
    stocks::forex::INFO,
    stocks::index::SINDEX_INFO,
    stocks::index::FINDEX_INFO,
    general::help::INFO,
];

/// Looks up a command by name.
pub fn find(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// A command name plus the raw text that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub rest: String,
}

impl Invocation {
    /// Parses `text` addressed with `prefix` (`!stock AAPL`) or the bot's nick
    /// (`ircquote: stock AAPL`). Returns `None` for ordinary chatter.
    pub fn parse(text: &str, prefix: &str, bot_nick: &str) -> Option<Self> {
        let text = text.trim();

        if !prefix.is_empty() {
            if let Some(body) = text.strip_prefix(prefix) {
                return Self::from_body(body);
            }
        }

        let (head, body) = text.split_once(char::is_whitespace)?;
        let addressed = head
            .strip_suffix([':', ','])
            .is_some_and(|nick| nick.eq_ignore_ascii_case(bot_nick));
        if addressed {
            Self::from_body(body)
        } else {
            None
        }
    }

    /// Parses an unprefixed `name args...` body, as sent in private messages.
    pub fn from_body(body: &str) -> Option<Self> {
        let body = body.trim();
        let (name, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_lowercase(),
            rest: rest.trim().to_string(),
        })
    }

    /// Whitespace separated arguments.
    pub fn args(&self) -> Vec<String> {
        self.rest.split_whitespace().map(str::to_string).collect()
    }
}

/// Runs `invocation`, reporting any failure back to the requester.
///
/// Unknown command names are ignored.
pub async fn dispatch(ctx: &Context, invocation: &Invocation) {
    let Some(info) = find(&invocation.name) else {
        debug!(name = %invocation.name, "Ignoring unknown command");
        return;
    };

    info!(
        command = info.name,
        nick = %ctx.replier.nick(),
        to = %ctx.replier.target(),
        "Running command"
    );

    if let Err(e) = run(ctx, info, invocation).await {
        if let Err(reply_err) = ctx.replier.error(&e.to_string()).await {
            error!(command = info.name, "Unable to report error: {}", reply_err);
        }
    }
}

async fn run(ctx: &Context, info: &CommandInfo, invocation: &Invocation) -> CommandResult {
    let args = invocation.args();
    match info.name {
        "chatgpt" => ai::chatgpt::chatgpt(ctx, &invocation.rest).await,
        "gpt3" => ai::gpt3::gpt3(ctx, &invocation.rest).await,
        "stock" => stocks::stock::stock(ctx, &args).await,
        "crypto" => stocks::stock::crypto(ctx, &args).await,
        "forex" => stocks::forex::forex(ctx, &args).await,
        "sindex" => stocks::index::sindex(ctx).await,
        "findex" => stocks::index::findex(ctx).await,
        "help" => general::help::help(ctx, &args).await,
        _ => Ok(()),
    }
}

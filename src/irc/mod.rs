//! Minimal IRC client: line parsing, text styling, replies and the connection loop.

/// Connection loop and command dispatch.
pub mod client;
/// mIRC text styling codes.
pub mod format;
/// Chunked replies to channels and users.
pub mod reply;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced by the IRC layer.
#[derive(Error, Debug)]
pub enum IrcError {
    /// Socket failure.
    #[error("Connection failure: {0}")]
    Io(#[from] std::io::Error),

    /// The server sent a line that could not be framed.
    #[error("Unable to read line: {0}")]
    Codec(#[from] tokio_util::codec::AnyDelimiterCodecError),

    /// A line could not be parsed as an IRC message.
    #[error("Malformed message: {0}")]
    Parse(String),

    /// The server closed the session.
    #[error("Server closed the connection: {0}")]
    Closed(String),
}

/// A single protocol line, e.g. `:nick!user@host PRIVMSG #chan :hello there`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    /// Builds a message without a prefix.
    pub fn new<C, I, P>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", [target, text])
    }

    /// The nick part of a `nick!user@host` prefix.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split(['!', '@']).next()?;
        (!nick.is_empty()).then_some(nick)
    }

    /// The parameter at `index`, if any.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl FromStr for Message {
    type Err = IrcError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        // IRCv3 tags are not used by any command.
        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map(|(_, r)| r).unwrap_or("");
        }

        let prefix = match rest.strip_prefix(':') {
            Some(prefixed) => {
                let (prefix, r) = prefixed
                    .split_once(' ')
                    .ok_or_else(|| IrcError::Parse(line.to_string()))?;
                rest = r;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => match rest.strip_prefix(':') {
                Some(trailing) => ("", Some(trailing)),
                None => (rest, None),
            },
        };

        let mut words = head.split(' ').filter(|w| !w.is_empty());
        let command = words
            .next()
            .ok_or_else(|| IrcError::Parse(line.to_string()))?
            .to_ascii_uppercase();

        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Ok(Self {
            prefix,
            command,
            params,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}

/// `true` for channel names (`#rust`, `&local`).
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&'])
}

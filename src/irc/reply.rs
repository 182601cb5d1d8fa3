//! Replies to the channel or user that invoked a command.
//!
//! Long replies are split with [`MessageChunker`]; only the first line carries
//! the requester's nick.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Message, format, is_channel};
use crate::utils::chunker::{ChunkError, MessageChunker};

/// Protocol limit for one line, CR LF excluded.
const MAX_LINE_BYTES: usize = 510;
/// Room left for the `:nick!user@host ` prefix servers add when relaying.
const HOSTMASK_RESERVE: usize = 64;
/// Floor for absurdly long targets.
const MIN_LINE_BYTES: usize = 64;

/// Errors raised while delivering a reply.
#[derive(Error, Debug)]
pub enum ReplyError {
    /// The connection's writer has shut down.
    #[error("Outbound queue closed")]
    Closed,

    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// One line of text addressed to a channel or nick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLine {
    pub target: String,
    pub text: String,
}

/// Anything that can deliver reply lines.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, line: OutboundLine) -> Result<(), ReplyError>;
}

#[async_trait]
impl ReplySink for mpsc::Sender<Message> {
    async fn send(&self, line: OutboundLine) -> Result<(), ReplyError> {
        mpsc::Sender::send(self, Message::privmsg(&line.target, &line.text))
            .await
            .map_err(|_| ReplyError::Closed)
    }
}

/// Reply handle for a single command invocation.
#[derive(Clone)]
pub struct Replier {
    sink: Arc<dyn ReplySink>,
    target: String,
    nick: String,
    prefix_nick: bool,
    chunker: MessageChunker,
}

impl Replier {
    /// Creates a replier for a message `nick` sent to `target`.
    ///
    /// Channel messages are answered in the channel with a `nick: ` prefix;
    /// private messages are answered to the sender without one.
    pub fn new(
        sink: Arc<dyn ReplySink>,
        target: &str,
        nick: &str,
        chunk_limit: usize,
    ) -> Result<Self, ReplyError> {
        let in_channel = is_channel(target);
        Ok(Self {
            sink,
            target: if in_channel { target } else { nick }.to_string(),
            nick: nick.to_string(),
            prefix_nick: in_channel,
            chunker: MessageChunker::new(chunk_limit)?,
        })
    }

    /// Where replies are sent.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The nick that invoked the command.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Sends `text`, split into as many lines as needed.
    pub async fn reply(&self, text: &str) -> Result<(), ReplyError> {
        let text = fold_line_breaks(text);
        if text.trim().is_empty() {
            debug!(to = %self.target, "Skipping empty reply");
            return Ok(());
        }

        let budget = self.line_budget();
        let mut first = self.prefix_nick;
        for chunk in self.chunker.chunks(&text) {
            if chunk.text.is_empty() {
                continue;
            }

            let line = if first {
                first = false;
                format!("{}: {}", self.nick, chunk.text)
            } else {
                chunk.text.to_string()
            };

            for piece in split_bytes(&line, budget) {
                debug!(to = %self.target, text = %format::strip(piece), "Sending reply");
                self.sink
                    .send(OutboundLine {
                        target: self.target.clone(),
                        text: piece.to_string(),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Bytes of text that fit in one `PRIVMSG` to this target once the
    /// server has prepended the sender's hostmask.
    fn line_budget(&self) -> usize {
        let overhead = "PRIVMSG ".len() + self.target.len() + " :".len() + HOSTMASK_RESERVE;
        MAX_LINE_BYTES.saturating_sub(overhead).max(MIN_LINE_BYTES)
    }

    /// Joins `items` with `joiner` and replies with the result.
    pub async fn replies<I, S>(&self, items: I, joiner: &str) -> Result<(), ReplyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(joiner);
        self.reply(&joined).await
    }

    /// Reports a failure to the requester.
    pub async fn error(&self, message: &str) -> Result<(), ReplyError> {
        warn!(nick = %self.nick, to = %self.target, "Command failed: {}", message);
        self.reply(&format!("Error: {message}")).await
    }
}

/// Cuts `line` at char boundaries into pieces of at most `max` bytes.
fn split_bytes(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while rest.len() > max {
        let mut cut = max;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single char wider than the budget still goes out whole.
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// IRC lines cannot carry CR or LF; upstream text often does.
fn fold_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

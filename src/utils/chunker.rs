//! Splits long replies into pieces that fit IRC's line length.
//!
//! A reply longer than the configured limit is cut at the last whitespace or
//! period inside the next `limit` characters. When the window holds neither,
//! the text is hard cut one character before the limit. Lengths are counted
//! in `char`s, never bytes, so multi-byte text is never split inside a
//! code point.

use thiserror::Error;

/// Default maximum number of characters per reply segment.
pub const DEFAULT_CHUNK_LIMIT: usize = 400;

/// Errors raised when constructing a [`MessageChunker`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    /// The chunk limit must be a positive number of characters.
    #[error("Invalid argument: chunk limit must be positive, got {0}")]
    InvalidArgument(usize),
}

/// A single piece of a chunked reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// The text to deliver.
    pub text: &'a str,
    /// `true` only for the first piece of a reply.
    pub is_first: bool,
}

/// Splits messages into chunks of at most `limit` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageChunker {
    limit: usize,
}

impl MessageChunker {
    /// Creates a chunker, rejecting a zero limit.
    pub fn new(limit: usize) -> Result<Self, ChunkError> {
        if limit == 0 {
            return Err(ChunkError::InvalidArgument(limit));
        }
        Ok(Self { limit })
    }

    /// The maximum number of characters per chunk.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns a lazy iterator over the chunks of `message`.
    pub fn chunks<'a>(&self, message: &'a str) -> Chunks<'a> {
        Chunks {
            remaining: Some(message),
            limit: self.limit,
            first: true,
            split: false,
        }
    }
}

impl Default for MessageChunker {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CHUNK_LIMIT,
        }
    }
}

/// Iterator returned by [`MessageChunker::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    remaining: Option<&'a str>,
    limit: usize,
    first: bool,
    // Set once a cut has been made; a message that fits is passed through untrimmed.
    split: bool,
}

impl<'a> Chunks<'a> {
    fn emit(&mut self, text: &'a str) -> Chunk<'a> {
        let is_first = self.first;
        self.first = false;
        Chunk { text, is_first }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining?;

        if !exceeds(remaining, self.limit) {
            self.remaining = None;
            let text = if self.split { remaining.trim() } else { remaining };
            return Some(self.emit(text));
        }

        let cut = split_index(remaining, self.limit);
        let (head, tail) = remaining.split_at(cut);
        self.remaining = Some(tail);
        self.split = true;

        Some(self.emit(head.trim()))
    }
}

/// `true` when `text` holds more than `limit` characters.
fn exceeds(text: &str, limit: usize) -> bool {
    text.char_indices().nth(limit).is_some()
}

/// Byte offset at which to cut `text`, which must be longer than `limit` chars.
fn split_index(text: &str, limit: usize) -> usize {
    let window = text.char_indices().take(limit);

    // Position just past the rightmost delimiter, so the delimiter stays with the head.
    let after_delimiter = window
        .filter(|(_, c)| c.is_whitespace() || *c == '.')
        .last()
        .map(|(i, c)| i + c.len_utf8());

    match after_delimiter {
        Some(cut) => cut,
        None => {
            let forced = (limit - 1).max(1);
            text.char_indices()
                .nth(forced)
                .map(|(i, _)| i)
                .unwrap_or(text.len())
        }
    }
}

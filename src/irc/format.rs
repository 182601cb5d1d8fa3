//! mIRC formatting control codes.

const BOLD: char = '\x02';
const COLOR: char = '\x03';

/// Foreground colours used by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
}

impl Color {
    /// Two-digit mIRC colour code.
    fn code(self) -> &'static str {
        match self {
            Color::Green => "03",
            Color::Red => "04",
        }
    }
}

/// Wraps `text` in bold codes.
pub fn bold(text: &str) -> String {
    format!("{BOLD}{text}{BOLD}")
}

/// Wraps `text` in a foreground colour.
pub fn color(text: &str, color: Color) -> String {
    format!("{COLOR}{}{text}{COLOR}", color.code())
}

/// Removes bold and colour codes, leaving the plain text.
pub fn strip(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            BOLD => {}
            COLOR => {
                // Up to two digits of foreground, optionally ",NN" background.
                for _ in 0..2 {
                    if chars.next_if(|c| c.is_ascii_digit()).is_none() {
                        break;
                    }
                }
                if chars.peek() == Some(&',') {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                        for _ in 0..2 {
                            if chars.next_if(|c| c.is_ascii_digit()).is_none() {
                                break;
                            }
                        }
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

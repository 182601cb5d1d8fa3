//! Market quotes from Yahoo Finance (`quoteSummary` price module) and
//! exchange rates from AlphaVantage.

/// Submodule defining the `forex` command.
pub mod forex;
/// Submodule defining the `sindex` and `findex` commands.
pub mod index;
/// Submodule defining the `stock` and `crypto` commands.
pub mod stock;

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use thousands::Separable;
use tracing::debug;
use url::Url;

use super::CommandError;
use crate::irc::format::{Color, bold, color};

/// Yahoo ticker symbols: letters, digits and `^ = : . -`, up to ten characters.
static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w^=:.\-]{1,10}$").expect("valid symbol pattern"));

/// Currency codes accepted by `forex`.
static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w^=:.\-]{1,3}$").expect("valid currency pattern"));

/// Separator between quotes of a multi-symbol reply.
pub const JOINER: &str = " | ";

/// Custom error type for quote lookups.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Error during HTTP request communication.
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    /// Error during JSON parsing.
    #[error("Unable to parse text from JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The API reported an error for this symbol.
    #[error("{symbol}: {message}")]
    BadRequest { symbol: String, message: String },

    /// The API answered without usable data.
    #[error("{0}: An error occurred.")]
    Invalid(String),
}

/// Helpers for reading loosely typed Yahoo JSON.
trait JsonParse {
    /// Numeric value, accepting both plain numbers and `{"raw": n, "fmt": "..."}` objects.
    fn f64(&self) -> Option<f64>;
    /// Non-empty string value.
    fn string(&self) -> Option<String>;
}

impl JsonParse for Value {
    fn f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => x.as_f64(),
            Value::Object(map) => map.get("raw").and_then(|raw| raw.f64()),
            _ => None,
        }
    }

    fn string(&self) -> Option<String> {
        match self {
            Value::String(x) if !x.is_empty() => Some(x.to_owned()),
            _ => None,
        }
    }
}

/// Checks a ticker symbol against [`SYMBOL_RE`].
pub fn validate_symbol(symbol: &str) -> Result<(), CommandError> {
    if SYMBOL_RE.is_match(symbol) {
        Ok(())
    } else {
        Err(CommandError::InvalidArgument {
            kind: "symbol",
            value: symbol.to_string(),
        })
    }
}

/// Checks a currency code against [`CURRENCY_RE`].
pub fn validate_currency(code: &str) -> Result<(), CommandError> {
    if CURRENCY_RE.is_match(code) {
        Ok(())
    } else {
        Err(CommandError::InvalidArgument {
            kind: "forex",
            value: code.to_string(),
        })
    }
}

/// Trading session reported by Yahoo.
#[derive(Debug, Clone, PartialEq)]
enum MarketState {
    Regular,
    Pre,
    Post,
    Other(String),
}

impl MarketState {
    fn parse(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("REGULAR") => MarketState::Regular,
            Some("PRE") => MarketState::Pre,
            Some("POST") => MarketState::Post,
            Some(other) => MarketState::Other(other.to_string()),
            None => MarketState::Other(String::new()),
        }
    }
}

/// Fields of the `price` module needed to format a quote.
#[derive(Debug, Clone, PartialEq)]
struct PriceData {
    short_name: String,
    currency: String,
    is_index: bool,
    market_state: MarketState,
    regular_price: Option<f64>,
    pre_price: Option<f64>,
    post_price: Option<f64>,
    previous_close: Option<f64>,
    day_high: Option<f64>,
    day_low: Option<f64>,
}

impl PriceData {
    fn from_json(symbol: &str, price: &Value) -> Self {
        Self {
            short_name: price["shortName"]
                .string()
                .or_else(|| price["longName"].string())
                .unwrap_or_else(|| symbol.to_string()),
            currency: price["currencySymbol"].string().unwrap_or_default(),
            is_index: price["quoteType"].string().as_deref() == Some("INDEX"),
            market_state: MarketState::parse(price["marketState"].string()),
            regular_price: price["regularMarketPrice"].f64(),
            pre_price: price["preMarketPrice"].f64(),
            post_price: price["postMarketPrice"].f64(),
            previous_close: price["regularMarketPreviousClose"].f64(),
            day_high: price["regularMarketDayHigh"].f64(),
            day_low: price["regularMarketDayLow"].f64(),
        }
    }

    /// The price for the current session and the label to show for it.
    ///
    /// Indexes always report the regular price and carry no label.
    fn session_price(&self) -> (Option<f64>, Option<String>) {
        if self.is_index {
            return (self.regular_price, None);
        }
        match &self.market_state {
            MarketState::Regular => (self.regular_price, Some("Open".to_string())),
            MarketState::Post => (
                self.post_price.or(self.regular_price),
                Some("Post-market".to_string()),
            ),
            MarketState::Pre => (
                self.pre_price.or(self.regular_price),
                Some("Pre-market".to_string()),
            ),
            MarketState::Other(raw) => (self.regular_price, Some(raw.clone()).filter(|s| !s.is_empty())),
        }
    }
}

/// Fetches the `price` module for `symbol`.
async fn fetch_price(http: &Client, base_url: &str, symbol: &str) -> Result<PriceData, QuoteError> {
    let mut url = Url::parse(base_url).map_err(|e| QuoteError::BadRequest {
        symbol: symbol.to_string(),
        message: format!("Invalid base URL '{base_url}': {e}"),
    })?;
    url.path_segments_mut()
        .map_err(|_| QuoteError::Invalid(symbol.to_string()))?
        .pop_if_empty()
        .extend(["v10", "finance", "quoteSummary", symbol]);

    debug!(url = %url, "Requesting quote");
    let text = http
        .get(url)
        .query(&[("modules", "price")])
        .send()
        .await?
        .text()
        .await?;
    let value: Value = serde_json::from_str(&text)?;

    let error = [&value["quoteSummary"]["error"], &value["finance"]["error"]]
        .into_iter()
        .find_map(|e| e["description"].string());
    if let Some(message) = error {
        return Err(QuoteError::BadRequest {
            symbol: symbol.to_string(),
            message,
        });
    }

    let price = &value["quoteSummary"]["result"][0]["price"];
    if !price.is_object() {
        return Err(QuoteError::Invalid(symbol.to_string()));
    }
    Ok(PriceData::from_json(symbol, price))
}

/// Rounds to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Formats a number with up to six significant digits (never in exponent
/// form), trailing zeros removed and thousands separated by commas.
pub fn format_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value.is_finite() { "0".to_string() } else { value.to_string() };
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };

    match trimmed {
        "-0" => "0".to_string(),
        s => s.separate_with_commas(),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "N/A".to_string())
}

/// Renders one quote line, e.g.
/// `AAPL : Apple Inc. $189.84 ▲ 1.23 (0.65%) High: 190.32 Low: 188.19 Open`.
fn format_quote(symbol: &str, data: &PriceData) -> Result<String, QuoteError> {
    let (price, state) = data.session_price();
    let (Some(price), Some(close)) = (price, data.previous_close) else {
        return Err(QuoteError::Invalid(symbol.to_string()));
    };

    let change = round2(price - close);
    let change_percent = if close != 0.0 {
        round2(change / close * 100.0)
    } else {
        0.0
    };

    let movement = if change >= 0.0 {
        color(
            &format!("▲ {} ({}%)", format_number(change), format_number(change_percent)),
            Color::Green,
        )
    } else {
        color(
            &format!("▼ {} ({}%)", format_number(change), format_number(change_percent)),
            Color::Red,
        )
    };

    let mut message = format!(
        "{} : {} {}{} {movement} High: {} Low: {}",
        bold(symbol),
        data.short_name,
        data.currency,
        format_number(price),
        format_optional(data.day_high),
        format_optional(data.day_low),
    );
    if let Some(state) = state {
        message.push(' ');
        message.push_str(&state);
    }
    Ok(message)
}

/// Validates, fetches and formats each symbol in order, stopping at the first failure.
pub async fn quote_lines(
    http: &Client,
    base_url: &str,
    symbols: &[String],
) -> Result<Vec<String>, crate::Error> {
    let mut lines = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        validate_symbol(symbol)?;
        let data = fetch_price(http, base_url, symbol).await?;
        lines.push(format_quote(symbol, &data)?);
    }
    Ok(lines)
}

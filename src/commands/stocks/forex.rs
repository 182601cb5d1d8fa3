use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{QuoteError, format_number, validate_currency};
use crate::commands::{CommandError, CommandInfo};
use crate::irc::format::bold;
use crate::{CommandResult, Context};

pub const INFO: CommandInfo = CommandInfo {
    name: "forex",
    usage: "<symbol> <symbol>",
    description: "Returns the exchange rate for a currency pair.",
};

/// Payload of AlphaVantage's `CURRENCY_EXCHANGE_RATE` function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ExchangeRate {
    #[serde(rename = "1. From_Currency Code")]
    from_code: String,
    #[serde(rename = "2. From_Currency Name")]
    from_name: String,
    #[serde(rename = "3. To_Currency Code")]
    to_code: String,
    #[serde(rename = "4. To_Currency Name")]
    to_name: String,
    #[serde(rename = "5. Exchange Rate")]
    rate: String,
    #[serde(rename = "6. Last Refreshed", default)]
    last_refreshed: Option<String>,
    #[serde(rename = "7. Time Zone", default)]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    rate: Option<ExchangeRate>,
    #[serde(rename = "Error Message")]
    error: Option<String>,
    /// Rate limit notices.
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

async fn fetch_rate(
    http: &Client,
    base_url: &str,
    api_key: &str,
    from: &str,
    to: &str,
) -> Result<ExchangeRate, QuoteError> {
    let label = format!("{from},{to}");
    let mut url = Url::parse(base_url).map_err(|e| QuoteError::BadRequest {
        symbol: label.clone(),
        message: format!("Invalid base URL '{base_url}': {e}"),
    })?;
    url.path_segments_mut()
        .map_err(|_| QuoteError::Invalid(label.clone()))?
        .pop_if_empty()
        .push("query");

    debug!(%from, %to, "Requesting exchange rate");
    let text = http
        .get(url)
        .query(&[
            ("function", "CURRENCY_EXCHANGE_RATE"),
            ("from_currency", from),
            ("to_currency", to),
            ("apikey", api_key),
        ])
        .send()
        .await?
        .text()
        .await?;
    let response: ExchangeRateResponse = serde_json::from_str(&text)?;

    if let Some(message) = response.error.or(response.note).or(response.information) {
        return Err(QuoteError::BadRequest {
            symbol: label,
            message,
        });
    }
    response.rate.ok_or(QuoteError::Invalid(label))
}

/// `USD:United States Dollar to EUR:Euro 0.9215 (as of 2023-05-01 12:34 UTC)`
fn format_rate(rate: &ExchangeRate) -> Result<String, QuoteError> {
    let price: f64 = rate
        .rate
        .trim()
        .parse()
        .map_err(|_| QuoteError::Invalid(format!("{},{}", rate.from_code, rate.to_code)))?;

    let mut message = format!(
        "{}:{} to {}:{} {}",
        bold(&rate.from_code),
        rate.from_name,
        bold(&rate.to_code),
        rate.to_name,
        format_number(price),
    );

    let refreshed = rate
        .last_refreshed
        .as_deref()
        .and_then(|raw| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S").ok());
    if let Some(refreshed) = refreshed {
        message.push_str(&format!(" (as of {}", refreshed.format("%Y-%m-%d %H:%M")));
        if let Some(zone) = rate.time_zone.as_deref().filter(|z| !z.is_empty()) {
            message.push(' ');
            message.push_str(zone);
        }
        message.push(')');
    }
    Ok(message)
}

/// Replies with the exchange rate between two currencies.
pub async fn forex(ctx: &Context, args: &[String]) -> CommandResult {
    let [from, to] = args else {
        return Err(INFO.usage_error().into());
    };
    validate_currency(from)?;
    validate_currency(to)?;

    let config = &ctx.data.config.stocks;
    let api_key = config
        .alphavantage_api_key
        .as_deref()
        .ok_or(CommandError::MissingApiKey {
            setting: "ALPHAVANTAGE_API_KEY",
        })?;

    info!(%from, %to, "Fetching exchange rate");
    let rate = fetch_rate(
        &ctx.data.http,
        &config.alphavantage_base_url,
        api_key,
        from,
        to,
    )
    .await?;
    ctx.replier.reply(&format_rate(&rate)?).await?;
    Ok(())
}

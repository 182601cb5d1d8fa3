use tracing::info;

use super::{JOINER, quote_lines};
use crate::commands::{CommandError, CommandInfo};
use crate::{CommandResult, Context};

pub const STOCK_INFO: CommandInfo = CommandInfo {
    name: "stock",
    usage: "<symbol> [<symbol> ...]",
    description: "Returns stock data for one or more symbols.",
};

pub const CRYPTO_INFO: CommandInfo = CommandInfo {
    name: "crypto",
    usage: "<crypto> [<crypto> ...]",
    description: "Returns cryptocurrency data for one or more symbols against the configured fiat currency.",
};

/// Rejects calls with more symbols than `max`.
fn check_symbol_count(max: usize, count: usize) -> Result<(), CommandError> {
    if count > max {
        return Err(CommandError::TooManySymbols { max, count });
    }
    Ok(())
}

/// Replies with quotes for each symbol, joined on one line.
pub async fn stock(ctx: &Context, symbols: &[String]) -> CommandResult {
    if symbols.is_empty() {
        return Err(STOCK_INFO.usage_error().into());
    }
    let config = &ctx.data.config.stocks;
    check_symbol_count(config.max_symbols, symbols.len())?;

    info!(?symbols, "Fetching stock quotes");
    let lines = quote_lines(&ctx.data.http, &config.yahoo_base_url, symbols).await?;
    ctx.replier.replies(lines, JOINER).await?;
    Ok(())
}

/// Like [`stock`], quoting each coin against the configured fiat (`BTC` becomes `BTC-USD`).
pub async fn crypto(ctx: &Context, coins: &[String]) -> CommandResult {
    if coins.is_empty() {
        return Err(CRYPTO_INFO.usage_error().into());
    }
    let config = &ctx.data.config.stocks;
    check_symbol_count(config.max_symbols, coins.len())?;

    let pairs: Vec<String> = coins
        .iter()
        .map(|coin| format!("{coin}-{}", config.crypto_fiat))
        .collect();

    info!(?pairs, "Fetching crypto quotes");
    let lines = quote_lines(&ctx.data.http, &config.yahoo_base_url, &pairs).await?;
    ctx.replier.replies(lines, JOINER).await?;
    Ok(())
}

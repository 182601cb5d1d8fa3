use tracing::info;

use super::{JOINER, quote_lines};
use crate::commands::CommandInfo;
use crate::{CommandResult, Context};

/// Major US indexes: Dow Jones, S&P 500, Nasdaq Composite, Russell 2000.
pub const US_INDEXES: [&str; 4] = ["^DJI", "^GSPC", "^IXIC", "^RUT"];

/// Major world indexes: DAX, CAC 40, FTSE 100, Nikkei 225.
pub const WORLD_INDEXES: [&str; 4] = ["^GDAXI", "^FCHI", "^FTSE", "^N225"];

pub const SINDEX_INFO: CommandInfo = CommandInfo {
    name: "sindex",
    usage: "",
    description: "Returns the major US market indexes.",
};

pub const FINDEX_INFO: CommandInfo = CommandInfo {
    name: "findex",
    usage: "",
    description: "Returns the major world market indexes.",
};

async fn reply_indexes(ctx: &Context, indexes: &[&str]) -> CommandResult {
    let symbols: Vec<String> = indexes.iter().map(|s| s.to_string()).collect();
    info!(?symbols, "Fetching index quotes");
    let lines = quote_lines(
        &ctx.data.http,
        &ctx.data.config.stocks.yahoo_base_url,
        &symbols,
    )
    .await?;
    ctx.replier.replies(lines, JOINER).await?;
    Ok(())
}

pub async fn sindex(ctx: &Context) -> CommandResult {
    reply_indexes(ctx, &US_INDEXES).await
}

pub async fn findex(ctx: &Context) -> CommandResult {
    reply_indexes(ctx, &WORLD_INDEXES).await
}

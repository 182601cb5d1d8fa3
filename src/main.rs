use std::sync::Arc;

use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ircquote::config::Config;
use ircquote::{Data, Error, irc};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ircquote=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;
    info!(
        server = %config.irc.server,
        nick = %config.irc.nick,
        channels = ?config.irc.channels,
        "Loaded configuration"
    );

    let data = Data::new(config)?;
    irc::client::run(Arc::new(data)).await?;
    Ok(())
}

//! Common test utilities, fixtures, and mocks


use std::collections::HashMap;
use std::sync::Arc;

use ircquote::commands::{self, Invocation};
use ircquote::config::Config;
use ircquote::irc::reply::{Replier, ReplySink};
use ircquote::{Context, Data};

use fixtures::{CHANNEL, NICK};

/// Builds a configuration from `vars` on top of a local server address.
pub fn config(vars: &[(&str, &str)]) -> Config {
    let mut map: HashMap<String, String> = HashMap::from([(
        "IRC_SERVER".to_string(),
        "127.0.0.1".to_string(),
    )]);
    map.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_lookup(|key| map.get(key).cloned()).expect("valid test configuration")
}

/// A command context replying to [`NICK`] in [`CHANNEL`] through `sink`.
pub fn context(config: Config, sink: Arc<dyn ReplySink>) -> Context {
    let replier = Replier::new(sink, CHANNEL, NICK, config.chunk_limit).expect("valid chunk limit");
    Context {
        data: Arc::new(Data::new(config).expect("HTTP client")),
        replier,
    }
}

/// Parses `text` as a channel message and dispatches it.
pub async fn run_command(ctx: &Context, text: &str) {
    let invocation = Invocation::parse(text, "!", "ircquote").expect("a command invocation");
    commands::dispatch(ctx, &invocation).await;
}

use tracing::{debug, info};

use super::OpenAiClient;
use crate::commands::CommandInfo;
use crate::{CommandResult, Context};

pub const INFO: CommandInfo = CommandInfo {
    name: "gpt3",
    usage: "<prompt>",
    description: "Returns the completion model's continuation of the prompt.",
};

/// Sends the prompt to the legacy completions endpoint and replies with each choice.
pub async fn gpt3(ctx: &Context, prompt: &str) -> CommandResult {
    if prompt.trim().is_empty() {
        return Err(INFO.usage_error().into());
    }

    let config = &ctx.data.config.openai;
    let client = OpenAiClient::from_config(&ctx.data.http, config)?;

    info!(model = %config.completion_model, nick = %ctx.replier.nick(), "Requesting completion");
    let answers = client.complete(&config.completion_model, prompt).await?;
    debug!("Received {} choice(s)", answers.len());

    for answer in answers {
        ctx.replier.reply(answer.trim()).await?;
    }
    Ok(())
}

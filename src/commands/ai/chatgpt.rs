use tracing::{debug, info};

use super::OpenAiClient;
use crate::commands::CommandInfo;
use crate::{CommandResult, Context};

pub const INFO: CommandInfo = CommandInfo {
    name: "chatgpt",
    usage: "<prompt>",
    description: "Returns the chat model's response to the prompt.",
};

/// Sends the prompt to the chat completions endpoint and replies with each choice.
pub async fn chatgpt(ctx: &Context, prompt: &str) -> CommandResult {
    if prompt.trim().is_empty() {
        return Err(INFO.usage_error().into());
    }

    let config = &ctx.data.config.openai;
    let client = OpenAiClient::from_config(&ctx.data.http, config)?;

    info!(model = %config.chat_model, nick = %ctx.replier.nick(), "Requesting chat completion");
    let answers = client.chat(&config.chat_model, prompt).await?;
    debug!("Received {} choice(s)", answers.len());

    for answer in answers {
        ctx.replier.reply(answer.trim()).await?;
    }
    Ok(())
}

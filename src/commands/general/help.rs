use crate::commands::{COMMANDS, CommandInfo, find};
use crate::{CommandResult, Context};

pub const INFO: CommandInfo = CommandInfo {
    name: "help",
    usage: "[<command>]",
    description: "Lists the available commands, or describes one of them.",
};

/// Help text for a single command: `(forex <symbol> <symbol>) -- Returns ...`.
pub fn describe(info: &CommandInfo) -> String {
    let signature = if info.usage.is_empty() {
        info.name.to_string()
    } else {
        format!("{} {}", info.name, info.usage)
    };
    format!("({signature}) -- {}", info.description)
}

/// Replies with the command list, or the help text for one command.
pub async fn help(ctx: &Context, args: &[String]) -> CommandResult {
    let text = match args.first() {
        Some(name) => match find(name) {
            Some(info) => describe(info),
            None => format!("There is no command called '{name}'."),
        },
        None => COMMANDS
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", "),
    };
    ctx.replier.reply(&text).await?;
    Ok(())
}

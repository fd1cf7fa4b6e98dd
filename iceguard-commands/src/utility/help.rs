use poise::CreateReply;

use crate::{COMMANDS, CommandMeta};
use iceguard_core::{Context, Error};
use iceguard_utils::embed::build_embed;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "/help [category]",
};

#[poise::command(slash_command, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Only show this category"] category: Option<String>,
) -> Result<(), Error> {
    let category = category.as_deref().map(str::trim).filter(|raw| !raw.is_empty());

    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted) = category
        && !categories.iter().any(|known| known.eq_ignore_ascii_case(wanted))
    {
        ctx.say(format!(
            "Unknown category `{}`. Available categories: {}.",
            wanted,
            categories.join(", ")
        ))
        .await?;
        return Ok(());
    }

    let commands = sorted_commands(category);
    let embed = build_embed(
        "Available Commands",
        grouped_help_description(&commands),
        Some("IceGuard applies slowmode automatically when chat gets busy."),
    );

    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut filtered: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|cmd| match category {
            Some(wanted) => cmd.category.eq_ignore_ascii_case(wanted),
            None => true,
        })
        .collect();

    filtered.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    filtered
}

fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut lines = Vec::new();
    let mut current_category = "";

    for command in commands {
        if command.category != current_category {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("**{}**", capitalize(command.category)));
            current_category = command.category;
        }
        lines.push(format!("`{}` - {}", command.usage, command.desc));
    }

    lines.join("\n")
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, grouped_help_description, sorted_commands};

    #[test]
    fn filters_by_category_case_insensitively() {
        let commands = sorted_commands(Some("Utility"));
        assert!(!commands.is_empty());
        assert!(commands.iter().all(|cmd| cmd.category == "utility"));
    }

    #[test]
    fn groups_under_category_headers() {
        let description = grouped_help_description(&sorted_commands(None));
        assert!(description.starts_with("**Cooldown**"));
        assert!(description.contains("**Utility**"));
        assert!(description.contains("`/setthreshold <messages>`"));
    }

    #[test]
    fn capitalizes_first_letter() {
        assert_eq!(capitalize("cooldown"), "Cooldown");
        assert_eq!(capitalize(""), "");
    }
}

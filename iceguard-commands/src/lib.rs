pub mod cooldown;
pub mod utility;

use iceguard_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    cooldown::setthreshold::META,
    cooldown::setwindow::META,
    cooldown::setcooldown::META,
    cooldown::toggle::ENABLE_META,
    cooldown::toggle::DISABLE_META,
    cooldown::status::META,
    cooldown::monitor::META,
    cooldown::resetconfig::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        cooldown::setthreshold::setthreshold(),
        cooldown::setwindow::setwindow(),
        cooldown::setcooldown::setcooldown(),
        cooldown::toggle::enable(),
        cooldown::toggle::disable(),
        cooldown::status::status(),
        cooldown::monitor::monitor(),
        cooldown::resetconfig::resetconfig(),
    ]
}

#[cfg(test)]
mod tests {
    use super::{COMMANDS, commands};

    #[test]
    fn every_command_has_help_metadata() {
        let registered = commands();
        assert_eq!(registered.len(), COMMANDS.len());
        for command in &registered {
            assert!(
                COMMANDS.iter().any(|meta| meta.name == command.name),
                "missing META for /{}",
                command.name
            );
        }
    }

    #[test]
    fn usages_are_slash_commands() {
        assert!(COMMANDS.iter().all(|meta| meta.usage.starts_with('/')));
    }
}

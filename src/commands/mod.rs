//! Built-in subcommands.

pub mod list;
pub mod state;
pub mod toggle;

use crate::cli::meta::NamedCommand;

pub type CommandFactory = fn() -> Box<dyn NamedCommand>;

fn list() -> Box<dyn NamedCommand> {
    Box::new(list::ListCommand)
}

fn state() -> Box<dyn NamedCommand> {
    Box::new(state::StateCommand)
}

fn enable() -> Box<dyn NamedCommand> {
    Box::new(toggle::ToggleCommand::enable())
}

fn disable() -> Box<dyn NamedCommand> {
    Box::new(toggle::ToggleCommand::disable())
}

/// Every built-in command, in listing order.
pub fn builtin() -> Vec<CommandFactory> {
    vec![
        list as CommandFactory,
        state as CommandFactory,
        enable as CommandFactory,
        disable as CommandFactory,
    ]
}

#[cfg(test)]
mod tests;

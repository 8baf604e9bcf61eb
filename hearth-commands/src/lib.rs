pub mod owner;

use hearth_core::{Data, Error};

/// Prefix for message-invoked commands.
pub const COMMAND_PREFIX: char = '!';

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![owner::restart::restart()]
}

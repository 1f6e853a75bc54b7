use crate::backends::{FlagState, validate_flag_key};
use crate::cli::meta::{Meta, NamedCommand};
use crate::context::Context;
use crate::error::{FlagonError, Result};

/// Prints whether a flag is on. Exits non-zero without a message when it is
/// off, so scripts can branch on the exit code alone.
pub struct StateCommand;

impl NamedCommand for StateCommand {
    fn name(&self) -> &str {
        "state"
    }

    fn synopsis(&self) -> &str {
        "Show whether a flag is on; exit status 1 when it is off"
    }

    fn run(&self, meta: &Meta, ctx: &Context, args: &[String]) -> Result<()> {
        let key = single_key(self.name(), args)?;
        validate_flag_key(key)?;

        let backend = meta.create_backend(ctx)?;
        let flag = backend.get_flag(ctx, key)?;
        let state = FlagState::from(&flag);
        meta.print(&state)?;

        if !state.enabled {
            return Err(FlagonError::FlagDisabled(state.key).silent());
        }
        Ok(())
    }
}

/// The one positional argument `command` expects.
pub(crate) fn single_key<'a>(command: &str, args: &'a [String]) -> Result<&'a str> {
    match args {
        [key] => Ok(key.as_str()),
        _ => Err(FlagonError::Usage(format!(
            "{} expects exactly one flag key (got {})",
            command,
            args.len()
        ))),
    }
}

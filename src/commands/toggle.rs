use super::state::single_key;
use crate::backends::{FlagState, validate_flag_key};
use crate::cli::flags::FlagGroup;
use crate::cli::meta::{COMMAND_GROUP, Meta, NamedCommand};
use crate::context::Context;
use crate::error::Result;
use crate::telemetry;
use clap::Arg;
use opentelemetry::KeyValue;
use opentelemetry::trace::Span as _;

const FLAG_COMMENT: &str = "comment";

/// `enable` and `disable`.
pub struct ToggleCommand {
    enabled: bool,
}

impl ToggleCommand {
    pub fn enable() -> Self {
        Self { enabled: true }
    }

    pub fn disable() -> Self {
        Self { enabled: false }
    }
}

impl NamedCommand for ToggleCommand {
    fn name(&self) -> &str {
        if self.enabled { "enable" } else { "disable" }
    }

    fn synopsis(&self) -> &str {
        if self.enabled {
            "Turn a flag on in the configured environment"
        } else {
            "Turn a flag off in the configured environment"
        }
    }

    fn flags(&self) -> FlagGroup {
        FlagGroup::new(COMMAND_GROUP).arg(
            Arg::new(FLAG_COMMENT)
                .long(FLAG_COMMENT)
                .value_name("text")
                .help("comment recorded in the flag's audit log"),
        )
    }

    fn run(&self, meta: &Meta, ctx: &Context, args: &[String]) -> Result<()> {
        let key = single_key(self.name(), args)?;
        validate_flag_key(key)?;
        let comment = ctx.flags().and_then(|f| f.get_str(FLAG_COMMENT));

        let backend = meta.create_backend(ctx)?;
        let mut span = meta.start_span(ctx, "set_enabled");
        span.set_attribute(KeyValue::new("flag.key", key.to_string()));
        span.set_attribute(KeyValue::new("flag.enabled", self.enabled));

        let flag = match backend.set_enabled(&ctx.with_span(&span), key, self.enabled, comment) {
            Ok(flag) => flag,
            Err(e) => {
                telemetry::record_error(&mut span, &e);
                return Err(e);
            }
        };
        span.end();

        tracing::info!(key, enabled = flag.enabled, "flag updated");
        meta.print(&FlagState::from(&flag))
    }
}

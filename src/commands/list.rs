use crate::backends::Flag;
use crate::cli::flags::{FlagGroup, ParsedFlags};
use crate::cli::meta::{COMMAND_GROUP, Meta, NamedCommand};
use crate::context::Context;
use crate::error::{FlagonError, Result};
use crate::telemetry;
use clap::{Arg, ArgAction};
use opentelemetry::KeyValue;
use opentelemetry::trace::Span as _;

const FLAG_TAG: &str = "tag";
const FLAG_INCLUDE_ARCHIVED: &str = "include-archived";

/// Options for the list command
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListOptions {
    /// A flag is listed only when it carries every one of these tags.
    pub tags: Vec<String>,
    pub include_archived: bool,
}

impl ListOptions {
    pub fn from_flags(flags: Option<&ParsedFlags>) -> Self {
        match flags {
            Some(flags) => Self {
                tags: flags.get_strings(FLAG_TAG),
                include_archived: flags.get_flag(FLAG_INCLUDE_ARCHIVED),
            },
            None => Self::default(),
        }
    }
}

pub struct ListCommand;

impl NamedCommand for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn synopsis(&self) -> &str {
        "List feature flags in the configured environment"
    }

    fn flags(&self) -> FlagGroup {
        FlagGroup::new(COMMAND_GROUP)
            .arg(
                Arg::new(FLAG_TAG)
                    .long(FLAG_TAG)
                    .value_name("tag")
                    .action(ArgAction::Append)
                    .help("only flags with this tag (repeatable)"),
            )
            .arg(
                Arg::new(FLAG_INCLUDE_ARCHIVED)
                    .long(FLAG_INCLUDE_ARCHIVED)
                    .action(ArgAction::SetTrue)
                    .help("include archived flags"),
            )
    }

    fn run(&self, meta: &Meta, ctx: &Context, args: &[String]) -> Result<()> {
        if !args.is_empty() {
            return Err(FlagonError::Usage(format!(
                "list takes no arguments (got '{}')",
                args.join(" ")
            )));
        }

        let options = ListOptions::from_flags(ctx.flags());
        let backend = meta.create_backend(ctx)?;

        let mut span = meta.start_span(ctx, "list_flags");
        let flags = match backend.list_flags(&ctx.with_span(&span)) {
            Ok(flags) => filter_flags(flags, &options),
            Err(e) => {
                telemetry::record_error(&mut span, &e);
                return Err(e);
            }
        };
        span.set_attribute(KeyValue::new("flags.count", flags.len() as i64));
        span.end();

        meta.print(&flags)
    }
}

pub fn filter_flags(flags: Vec<Flag>, options: &ListOptions) -> Vec<Flag> {
    flags
        .into_iter()
        .filter(|f| options.include_archived || !f.archived)
        .filter(|f| options.tags.iter().all(|t| f.tags.contains(t)))
        .collect()
}

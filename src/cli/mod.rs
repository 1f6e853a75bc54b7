pub mod app;
pub mod flags;
pub mod meta;
pub mod output;

pub use app::App;
pub use flags::{FlagGroup, FlagSet, ParsedFlags, combine_flags};
pub use meta::{EXIT_FAILURE, EXIT_REPORTED_FAILURE, EXIT_SUCCESS, Meta, NamedCommand};
pub use output::OutputMode;

//! # Flag groups
//!
//! Every invocation parses one flat set of options assembled from groups
//! that are owned by different parts of the program: the command's own
//! options, the common options, and one group per backend. Groups are merged
//! without namespacing, so two groups must never define the same option.
//!
//! The group a flag came from is kept only for help output.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

/// Id of the synthetic positional that collects the non-option residue.
const RESIDUE_ID: &str = "__residue";
const REDACTED: &str = "[redacted]";

/// A named set of option definitions.
#[derive(Debug, Clone)]
pub struct FlagGroup {
    pub name: String,
    args: Vec<Arg>,
    secrets: Vec<String>,
}

impl FlagGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Add an option whose value must never be recorded anywhere.
    pub fn secret(mut self, arg: Arg) -> Self {
        self.secrets.push(arg.get_id().to_string());
        self.args.push(arg);
        self
    }

    /// One line per option, aligned on the help column.
    pub fn usage(&self) -> String {
        let rows: Vec<(String, String)> = self.args.iter().map(usage_row).collect();
        let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);

        let mut out = String::new();
        for (left, help) in rows {
            if help.is_empty() {
                out.push_str(&format!("{}\n", left));
            } else {
                out.push_str(&format!("{:width$}   {}\n", left, help, width = width));
            }
        }
        out
    }
}

fn usage_row(arg: &Arg) -> (String, String) {
    let mut left = match (arg.get_short(), arg.get_long()) {
        (Some(short), Some(long)) => format!("  -{}, --{}", short, long),
        (Some(short), None) => format!("  -{}", short),
        (None, Some(long)) => format!("      --{}", long),
        (None, None) => format!("      {}", arg.get_id()),
    };

    if takes_value(arg) {
        let placeholder = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "string".to_string());
        left.push(' ');
        left.push_str(&placeholder);
    }

    let mut help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
    let defaults: Vec<String> = arg
        .get_default_values()
        .iter()
        .map(|v| v.to_string_lossy().into_owned())
        .collect();
    if takes_value(arg) && !defaults.is_empty() {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&format!("(default {:?})", defaults.join(",")));
    }

    (left, help)
}

fn takes_value(arg: &Arg) -> bool {
    !matches!(
        arg.get_action(),
        ArgAction::SetTrue
            | ArgAction::SetFalse
            | ArgAction::Count
            | ArgAction::Help
            | ArgAction::HelpShort
            | ArgAction::HelpLong
            | ArgAction::Version
    )
}

/// Merged, parse-ready option set.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: Option<String>,
    args: Vec<Arg>,
    secrets: Vec<String>,
}

/// Merge `groups` into one parse set.
///
/// The set is named after the first group; every group's options are added
/// in order. No groups yields an empty set.
pub fn combine_flags(groups: &[FlagGroup]) -> FlagSet {
    let Some(first) = groups.first() else {
        return FlagSet::empty();
    };

    let mut set = FlagSet {
        name: Some(first.name.clone()),
        args: Vec::new(),
        secrets: Vec::new(),
    };
    for group in groups {
        set.args.extend(group.args.iter().cloned());
        set.secrets.extend(group.secrets.iter().cloned());
    }
    set
}

impl FlagSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.args.iter().map(|a| a.get_id().to_string()).collect()
    }

    /// Parse `args` (without the program or command name).
    ///
    /// Positional arguments may be mixed with options; they are returned in
    /// order as the residue. `--` ends option parsing.
    pub fn parse<I, T>(&self, args: I) -> Result<ParsedFlags, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let command = Command::new(self.name.clone().unwrap_or_default())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args(self.args.iter().cloned())
            .arg(
                Arg::new(RESIDUE_ID)
                    .num_args(0..)
                    .action(ArgAction::Append)
                    .value_name("args")
                    .hide(true),
            );

        let matches = command.try_get_matches_from(args)?;
        let residue = matches
            .get_many::<String>(RESIDUE_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Ok(ParsedFlags {
            matches,
            names: self.names(),
            residue,
            secrets: self.secrets.clone(),
        })
    }
}

/// Result of parsing a [`FlagSet`].
#[derive(Debug, Clone)]
pub struct ParsedFlags {
    matches: ArgMatches,
    names: Vec<String>,
    residue: Vec<String>,
    secrets: Vec<String>,
}

impl ParsedFlags {
    /// Positional arguments left after option parsing.
    pub fn args(&self) -> &[String] {
        &self.residue
    }

    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }

    pub fn get_one<T>(&self, name: &str) -> Option<&T>
    where
        T: std::any::Any + Clone + Send + Sync + 'static,
    {
        self.matches.try_get_one::<T>(name).ok().flatten()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_one::<String>(name).map(String::as_str)
    }

    pub fn get_strings(&self, name: &str) -> Vec<String> {
        self.matches
            .try_get_many::<String>(name)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_flag(&self, name: &str) -> bool {
        self.get_one::<bool>(name).copied().unwrap_or(false)
    }

    /// Whether the option was given on the command line, as opposed to
    /// coming from its default.
    pub fn was_set(&self, name: &str) -> bool {
        matches!(
            self.matches.value_source(name),
            Some(ValueSource::CommandLine)
        )
    }

    /// Raw value of every option that has one, in definition order.
    /// Secret options report a placeholder.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for name in &self.names {
            let Ok(Some(raw)) = self.matches.try_get_raw(name) else {
                continue;
            };
            let value = if self.secrets.contains(name) {
                REDACTED.to_string()
            } else {
                raw.map(|v| v.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            out.push((name.clone(), value));
        }
        out
    }
}

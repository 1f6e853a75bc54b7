//! Top-level router: picks the subcommand named by the first argument and
//! hands the rest to its [`Meta`].

use crate::backends::BackendRegistry;
use crate::cli::meta::{EXIT_SUCCESS, Meta, NamedCommand};
use crate::commands::{self, CommandFactory};
use crate::context::CancellationToken;
use crate::environment::Environment;
use crate::project_identity::{self, BINARY_NAME, DISPLAY_NAME};
use crate::ui::Ui;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;

/// Exit code for an unknown subcommand, as shells use for "command not
/// found".
pub const EXIT_UNKNOWN_COMMAND: i32 = 127;

pub struct App {
    ui: Arc<dyn Ui>,
    provider: SdkTracerProvider,
    commands: Vec<CommandFactory>,
    registry: Arc<BackendRegistry>,
    env: Option<Environment>,
    cancel: CancellationToken,
}

impl App {
    /// App with the built-in commands and backends.
    pub fn new(ui: Arc<dyn Ui>, provider: SdkTracerProvider) -> Self {
        Self {
            ui,
            provider,
            commands: commands::builtin(),
            registry: Arc::new(BackendRegistry::with_defaults()),
            env: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Use `env` instead of the process environment.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run with `args`, excluding the program name. Returns the exit code.
    pub fn run(&self, args: &[String]) -> i32 {
        let Some((name, rest)) = args.split_first() else {
            self.ui.output(&self.usage());
            return EXIT_SUCCESS;
        };

        match name.as_str() {
            "-h" | "--help" | "help" => {
                self.ui.output(&self.usage());
                return EXIT_SUCCESS;
            }
            "-v" | "--version" | "version" => {
                self.ui
                    .output(&format!("{} {}", BINARY_NAME, env!("CARGO_PKG_VERSION")));
                return EXIT_SUCCESS;
            }
            _ => {}
        }

        let Some(factory) = self.commands.iter().find(|f| f().name() == name.as_str()) else {
            self.ui.error(&format!("unknown command: {}", name));
            self.ui.output(&self.usage());
            return EXIT_UNKNOWN_COMMAND;
        };

        let mut meta = Meta::new(Arc::clone(&self.ui), factory(), &self.provider)
            .with_registry(Arc::clone(&self.registry))
            .with_cancellation(self.cancel.clone());
        if let Some(env) = &self.env {
            meta = meta.with_environment(env.clone());
        }

        if wants_help(rest) {
            self.ui.output(&meta.help());
            return EXIT_SUCCESS;
        }

        tracing::debug!(command = %name, "dispatching");
        meta.run(rest)
    }

    /// Command listing.
    pub fn usage(&self) -> String {
        let commands: Vec<Box<dyn NamedCommand>> =
            self.commands.iter().map(|f| f()).collect();
        let width = commands.iter().map(|c| c.name().len()).max().unwrap_or(0);

        let mut out = format!(
            "{} manages feature flags.\n\nUsage: {} <command> [flags] [args]\n\nCommands:\n",
            DISPLAY_NAME, BINARY_NAME
        );
        for cmd in &commands {
            out.push_str(&format!(
                "  {:width$}   {}\n",
                cmd.name(),
                cmd.synopsis(),
                width = width
            ));
        }
        out.push_str(&format!(
            "\nRun '{}' for the flags of a command.",
            project_identity::cli_with("<command> --help")
        ));
        out
    }
}

/// `-h`/`--help` anywhere before `--`.
fn wants_help(args: &[String]) -> bool {
    args.iter()
        .take_while(|a| a.as_str() != "--")
        .any(|a| a == "-h" || a == "--help")
}

//! # Command execution
//!
//! [`Meta`] is the per-invocation state every subcommand runs inside. It owns
//! the option groups, the tracer for the command, the selected backend and
//! output mode, and turns the subcommand's result into an exit code:
//!
//! | Outcome | Exit code | Printed |
//! |---|---|---|
//! | success | [`EXIT_SUCCESS`] | nothing extra |
//! | option parse failure | [`EXIT_FAILURE`] | parse error |
//! | silent error | [`EXIT_FAILURE`] | nothing |
//! | any other error | [`EXIT_REPORTED_FAILURE`] | the error |

use crate::backends::{Backend, BackendInputs, BackendRegistry};
use crate::cli::flags::{FlagGroup, ParsedFlags, combine_flags};
use crate::cli::output::{OutputMode, STRUCTURED_KEYWORD};
use crate::context::{CancellationToken, Context};
use crate::environment::Environment;
use crate::error::Result;
use crate::project_identity::{self, DEFAULT_BACKEND, TRACE_PARENT_ENV};
use crate::telemetry;
use crate::ui::Ui;
use clap::{Arg, ArgAction};
use opentelemetry::KeyValue;
use opentelemetry::trace::{Span as _, Status, Tracer as _, TracerProvider as _};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, Span};
use serde::Serialize;
use std::sync::Arc;

pub const EXIT_SUCCESS: i32 = 0;
/// Option parse failure, or a failure the command already reported.
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_REPORTED_FAILURE: i32 = 2;

pub const FLAG_BACKEND: &str = "backend";
pub const FLAG_OUTPUT: &str = "output";
pub const FLAG_SILENT: &str = "silent";

pub const COMMAND_GROUP: &str = "Command";
pub const COMMON_GROUP: &str = "Common";

/// A subcommand.
pub trait NamedCommand: Send + Sync {
    fn name(&self) -> &str;

    /// One line shown in command listings and at the top of help.
    fn synopsis(&self) -> &str;

    /// The command's own options. Defaults to none.
    fn flags(&self) -> FlagGroup {
        FlagGroup::new(COMMAND_GROUP)
    }

    /// Run the command. `ctx` carries the parsed options; `args` holds the
    /// positional arguments left after option parsing.
    fn run(&self, meta: &Meta, ctx: &Context, args: &[String]) -> Result<()>;
}

pub struct Meta {
    ui: Arc<dyn Ui>,
    tracer: SdkTracer,
    cmd: Box<dyn NamedCommand>,
    backend: String,
    output: OutputMode,
    silent: bool,
    registry: Arc<BackendRegistry>,
    env: Environment,
    flags: Option<ParsedFlags>,
    test_backend: Option<Arc<dyn Backend>>,
    cancel: CancellationToken,
}

impl Meta {
    /// Spans go to `provider`, under a tracer named after the command.
    pub fn new(
        ui: Arc<dyn Ui>,
        cmd: Box<dyn NamedCommand>,
        provider: &SdkTracerProvider,
    ) -> Self {
        let env = Environment::from_process();
        Self {
            ui,
            tracer: provider.tracer(cmd.name().to_string()),
            cmd,
            backend: resolve_backend_name(&env, None),
            output: OutputMode::default(),
            silent: false,
            registry: Arc::new(BackendRegistry::with_defaults()),
            env,
            flags: None,
            test_backend: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<BackendRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the captured process environment.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.backend = resolve_backend_name(&env, self.flags.as_ref());
        self.env = env;
        self
    }

    /// Hand every `create_backend` call this backend instead of building
    /// one. For tests.
    pub fn with_test_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.test_backend = Some(backend);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    /// Start a span as a child of the span `ctx` carries. It ends when
    /// dropped.
    pub fn start_span(&self, ctx: &Context, name: &str) -> Span {
        self.tracer.start_with_context(name.to_string(), ctx.otel())
    }

    pub fn command(&self) -> &dyn NamedCommand {
        self.cmd.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        &self.backend
    }

    pub fn output_mode(&self) -> &OutputMode {
        &self.output
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Option groups in help and parse order: the command's own, the common
    /// options, then one group per registered backend.
    pub fn all_flags(&self) -> Vec<FlagGroup> {
        let mut groups = vec![self.cmd.flags(), common_flags()];
        groups.extend(self.registry.flag_groups());
        groups
    }

    pub fn help(&self) -> String {
        let mut out = format!("{}\n\n", self.cmd.synopsis());
        for group in self.all_flags() {
            out.push_str(&format!("{} flags\n\n{}\n", group.name, group.usage()));
        }
        out
    }

    /// Build the selected backend.
    ///
    /// Nothing is cached: each call constructs (and validates) a new
    /// instance, unless a test backend was injected.
    pub fn create_backend(&self, ctx: &Context) -> Result<Arc<dyn Backend>> {
        let mut span = self.start_span(ctx, "create_backend");

        if let Some(backend) = &self.test_backend {
            span.set_attribute(KeyValue::new("backend", "mock"));
            return Ok(Arc::clone(backend));
        }
        span.set_attribute(KeyValue::new("backend", self.backend.clone()));

        let ctx = ctx.with_span(&span);
        let inputs = BackendInputs {
            ctx: &ctx,
            env: &self.env,
            flags: ctx.flags().or(self.flags.as_ref()),
        };

        let result = self.registry.create(&self.backend, &inputs);
        if let Err(err) = &result {
            telemetry::record_error(&mut span, err);
        }
        result
    }

    /// Write `value` in the selected output mode. Does nothing in silent
    /// mode.
    pub fn print<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if self.silent {
            return Ok(());
        }
        let text = self.output.render(value)?;
        self.ui.output(&text);
        Ok(())
    }

    /// Parse `args`, run the command and map the outcome to an exit code.
    pub fn run(&mut self, args: &[String]) -> i32 {
        let mut ctx = Context::background().with_cancellation(self.cancel.clone());
        if let Some(token) = self.env.get(TRACE_PARENT_ENV) {
            ctx = telemetry::with_trace_parent(&ctx, token);
        }
        let mut span = self.start_span(&ctx, self.cmd.name());
        log_span_start(&ctx, &span);
        let ctx = ctx.with_span(&span);

        let parsed = match combine_flags(&self.all_flags()).parse(args.iter().cloned()) {
            Ok(parsed) => parsed,
            Err(err) => {
                let message = parse_error_message(&err);
                span.record_error(&err);
                span.set_status(Status::error(message.clone()));
                self.ui.error(&message);
                return EXIT_FAILURE;
            }
        };

        self.apply_flags(&parsed);
        let ctx = telemetry::store_flags(&ctx, &mut span, parsed.clone());
        span.set_attribute(KeyValue::new("backend", self.backend.clone()));
        let residue = parsed.args().to_vec();
        self.flags = Some(parsed);

        let meta: &Meta = self;
        match meta.cmd.run(meta, &ctx, &residue) {
            Ok(()) => {
                span.set_status(Status::Ok);
                EXIT_SUCCESS
            }
            Err(err) if err.is_silent() => {
                tracing::debug!(error = %err, "command failed silently");
                EXIT_FAILURE
            }
            Err(err) => {
                telemetry::record_error(&mut span, &err);
                meta.ui.error(&err.to_string());
                EXIT_REPORTED_FAILURE
            }
        }
    }

    fn apply_flags(&mut self, flags: &ParsedFlags) {
        self.backend = resolve_backend_name(&self.env, Some(flags));
        if let Some(mode) = flags.get_one::<OutputMode>(FLAG_OUTPUT) {
            self.output = mode.clone();
        }
        self.silent = flags.get_flag(FLAG_SILENT);
    }
}

/// `--backend` when given on the command line, else `FLAGON_BACKEND`, else
/// the built-in default.
pub fn resolve_backend_name(env: &Environment, flags: Option<&ParsedFlags>) -> String {
    if let Some(flags) = flags
        && flags.was_set(FLAG_BACKEND)
        && let Some(name) = flags.get_str(FLAG_BACKEND)
    {
        return name.to_string();
    }
    env.get(&project_identity::backend_env_key())
        .unwrap_or(DEFAULT_BACKEND)
        .to_string()
}

/// Ids of a newly started command span and of its parent, if any.
fn log_span_start(parent: &Context, span: &Span) {
    let parent = parent.span_context();
    let started = span.span_context();
    tracing::debug!(
        target: "flagon::span",
        trace_id = %started.trace_id(),
        span_id = %started.span_id(),
        parent_span_id = %parent.span_id(),
        remote_parent = parent.is_remote(),
        "command span started"
    );
}

fn common_flags() -> FlagGroup {
    FlagGroup::new(COMMON_GROUP)
        .arg(
            Arg::new(FLAG_BACKEND)
                .long(FLAG_BACKEND)
                .value_name("name")
                .default_value(DEFAULT_BACKEND)
                .help(format!(
                    "feature flag backend [env {}]",
                    project_identity::backend_env_key()
                )),
        )
        .arg(
            Arg::new(FLAG_OUTPUT)
                .long(FLAG_OUTPUT)
                .value_name("json|template=TEXT")
                .default_value(STRUCTURED_KEYWORD)
                .value_parser(OutputMode::parse_flag)
                .help("output format"),
        )
        .arg(
            Arg::new(FLAG_SILENT)
                .long(FLAG_SILENT)
                .action(ArgAction::SetTrue)
                .help("print nothing on success"),
        )
}

/// First line of clap's message, which is the one naming the problem. The
/// rest is usage for a synthetic command and would only confuse.
fn parse_error_message(err: &clap::Error) -> String {
    let text = err.to_string();
    text.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("invalid arguments")
        .trim_end()
        .to_string()
}

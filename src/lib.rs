pub mod backends;
pub mod cli;
pub mod commands;
pub mod context;
pub mod environment;
pub mod error;
pub mod project_identity;
pub mod telemetry;
pub mod template;
pub mod ui;

use context::CancellationToken;
use std::process::exit;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Run flagon CLI entrypoint.
pub fn run_cli() {
    // 1. Diagnostics go to stderr, filtered by FLAGON_LOG
    let filter = EnvFilter::try_from_env(project_identity::log_env_key())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // 2. Signal handling: flip the token, requests in flight notice it
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    // 3. Route & run
    let ui: Arc<dyn ui::Ui> = Arc::new(ui::ConsoleUi::new());
    let provider = telemetry::provider();
    let app = cli::App::new(ui, provider.clone()).with_cancellation(cancel);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = app.run(&args);

    // 4. Flush span processors before exit() skips destructors
    if let Err(e) = provider.shutdown() {
        tracing::debug!(error = %e, "tracer provider shutdown failed");
    }
    exit(code);
}

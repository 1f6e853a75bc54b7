use super::*;
use crate::backends::memory::MemoryBackend;
use crate::backends::{Backend, Flag};
use crate::cli::meta::{EXIT_FAILURE, EXIT_REPORTED_FAILURE, EXIT_SUCCESS, Meta};
use crate::context::Context;
use crate::environment::Environment;
use crate::ui::BufferUi;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;

fn backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_flag("checkout", true, &["web", "payments"])
            .with_flag("search", false, &["web"])
            .with_archived_flag("legacy"),
    )
}

fn run_command(
    cmd: Box<dyn NamedCommand>,
    backend: Arc<MemoryBackend>,
    args: &[&str],
) -> (i32, Arc<BufferUi>) {
    let ui = Arc::new(BufferUi::new());
    let mut meta = Meta::new(ui.clone(), cmd, &SdkTracerProvider::builder().build())
        .with_environment(Environment::empty())
        .with_test_backend(backend);
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    (meta.run(&args), ui)
}

fn listed_keys(ui: &BufferUi) -> Vec<String> {
    let flags: Vec<Flag> = serde_json::from_str(ui.output_text().trim_end()).expect("json list");
    flags.into_iter().map(|f| f.key).collect()
}

#[test]
fn builtin_commands_in_listing_order() {
    let names: Vec<String> = builtin().iter().map(|f| f().name().to_string()).collect();
    assert_eq!(names, vec!["list", "state", "enable", "disable"]);
}

#[test]
fn list_hides_archived_by_default() {
    let (code, ui) = run_command(Box::new(list::ListCommand), backend(), &[]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(listed_keys(&ui), vec!["checkout", "search"]);
}

#[test]
fn list_filters_by_every_tag() {
    let (code, ui) = run_command(
        Box::new(list::ListCommand),
        backend(),
        &["--tag", "web", "--tag", "payments"],
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(listed_keys(&ui), vec!["checkout"]);
}

#[test]
fn list_can_include_archived() {
    let (_, ui) = run_command(
        Box::new(list::ListCommand),
        backend(),
        &["--include-archived"],
    );
    assert_eq!(listed_keys(&ui), vec!["checkout", "search", "legacy"]);
}

#[test]
fn list_rejects_positional_arguments() {
    let (code, ui) = run_command(Box::new(list::ListCommand), backend(), &["extra"]);
    assert_eq!(code, EXIT_REPORTED_FAILURE);
    assert!(ui.error_text().contains("list takes no arguments"));
}

#[test]
fn list_renders_templates_over_the_list() {
    let (code, ui) = run_command(
        Box::new(list::ListCommand),
        backend(),
        &["--output", "template={{range .}}{{.key}} {{end}}"],
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(ui.output_text(), "checkout search \n");
}

#[test]
fn state_of_enabled_flag_succeeds() {
    let (code, ui) = run_command(Box::new(state::StateCommand), backend(), &["checkout"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(ui.output_text(), "{\"key\":\"checkout\",\"enabled\":true}\n");
}

#[test]
fn state_of_disabled_flag_fails_silently() {
    let (code, ui) = run_command(Box::new(state::StateCommand), backend(), &["search"]);
    assert_eq!(code, EXIT_FAILURE);
    assert_eq!(ui.output_text(), "{\"key\":\"search\",\"enabled\":false}\n");
    assert_eq!(ui.error_text(), "");
}

#[test]
fn state_of_missing_flag_is_reported() {
    let (code, ui) = run_command(Box::new(state::StateCommand), backend(), &["ghost"]);
    assert_eq!(code, EXIT_REPORTED_FAILURE);
    assert_eq!(ui.error_text(), "Flag not found: ghost\n");
}

#[test]
fn state_needs_exactly_one_key() {
    for args in [&[][..], &["a", "b"][..]] {
        let (code, ui) = run_command(Box::new(state::StateCommand), backend(), args);
        assert_eq!(code, EXIT_REPORTED_FAILURE);
        assert!(ui.error_text().contains("expects exactly one flag key"));
    }
}

#[test]
fn enable_and_disable_update_the_backend() {
    let shared = backend();

    let (code, ui) = run_command(
        Box::new(toggle::ToggleCommand::enable()),
        shared.clone(),
        &["search", "--comment", "launch"],
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(ui.output_text(), "{\"key\":\"search\",\"enabled\":true}\n");
    let ctx = Context::background();
    assert!(shared.get_flag(&ctx, "search").expect("flag").enabled);

    let (code, _) = run_command(
        Box::new(toggle::ToggleCommand::disable()),
        shared.clone(),
        &["checkout", "--silent"],
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert!(!shared.get_flag(&ctx, "checkout").expect("flag").enabled);
}

#[test]
fn toggle_rejects_invalid_keys() {
    let (code, ui) = run_command(
        Box::new(toggle::ToggleCommand::enable()),
        backend(),
        &["../admin"],
    );
    assert_eq!(code, EXIT_REPORTED_FAILURE);
    assert!(ui.error_text().contains("invalid flag key"));
}

use super::*;
use crate::cli::flags::{FlagGroup, combine_flags};
use clap::{Arg, ArgAction};
use opentelemetry::trace::{SpanId, TraceId, Tracer, TracerProvider};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};

const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

fn recording_provider() -> (SdkTracerProvider, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider, exporter)
}

fn span_named(exporter: &InMemorySpanExporter, name: &str) -> SpanData {
    exporter
        .get_finished_spans()
        .expect("finished spans")
        .into_iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no span named {name}"))
}

fn attr(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

fn start_in(provider: &SdkTracerProvider, ctx: &Context, name: &str) {
    provider
        .tracer("test")
        .start_with_context(name.to_string(), ctx.otel())
        .end();
}

#[test]
fn span_under_trace_parent_joins_remote_trace() {
    let (provider, exporter) = recording_provider();

    let ctx = with_trace_parent(&Context::background(), TRACEPARENT);
    assert!(ctx.span_context().is_remote());
    assert!(ctx.span_context().is_sampled());
    start_in(&provider, &ctx, "state");

    let span = span_named(&exporter, "state");
    assert_eq!(
        span.span_context.trace_id(),
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").expect("hex")
    );
    assert_eq!(
        span.parent_span_id,
        SpanId::from_hex("00f067aa0ba902b7").expect("hex")
    );
    assert_ne!(span.span_context.span_id(), span.parent_span_id);
}

#[test]
fn span_without_trace_parent_starts_new_root() {
    let (provider, exporter) = recording_provider();

    let ctx = with_trace_parent(&Context::background(), "");
    start_in(&provider, &ctx, "list");

    let span = span_named(&exporter, "list");
    assert_eq!(span.parent_span_id, SpanId::INVALID);
    assert!(span.span_context.is_valid());
}

#[test]
fn malformed_trace_parents_are_ignored() {
    let bad = [
        "garbage",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
        "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
        "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
        "00-zzf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
    ];
    for value in bad {
        let ctx = with_trace_parent(&Context::background(), value);
        assert!(!ctx.span_context().is_valid(), "accepted {value:?}");
    }
}

#[test]
fn signed_hex_fields_are_rejected() {
    let bad = [
        "00-+bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-+0f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-+1",
    ];
    for value in bad {
        let ctx = with_trace_parent(&Context::background(), value);
        assert!(!ctx.span_context().is_valid(), "accepted {value:?}");
    }
}

#[test]
fn uppercase_ids_are_rejected() {
    let bad = [
        "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00F067AA0BA902B7-01",
    ];
    for value in bad {
        let ctx = with_trace_parent(&Context::background(), value);
        assert!(!ctx.span_context().is_valid(), "accepted {value:?}");
    }
}

#[test]
fn future_versions_may_carry_extra_fields() {
    let value = "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00-future";
    let ctx = with_trace_parent(&Context::background(), value);
    assert!(ctx.span_context().is_valid());
    assert!(!ctx.span_context().is_sampled());
}

#[test]
fn child_spans_share_trace_and_point_at_parent() {
    let (provider, exporter) = recording_provider();
    let tracer = provider.tracer("list");

    let root = tracer.start_with_context("list", Context::background().otel());
    let ctx = Context::background().with_span(&root);
    start_in(&provider, &ctx, "create_backend");
    drop(root);

    let child = span_named(&exporter, "create_backend");
    let root = span_named(&exporter, "list");
    assert_eq!(
        child.span_context.trace_id(),
        root.span_context.trace_id()
    );
    assert_eq!(child.parent_span_id, root.span_context.span_id());
}

#[test]
fn record_error_sets_status_and_event() {
    let (provider, exporter) = recording_provider();
    let mut span = provider
        .tracer("t")
        .start_with_context("op", Context::background().otel());
    let err = std::io::Error::other("boom");
    record_error(&mut span, &err);
    span.end();

    let data = span_named(&exporter, "op");
    assert_eq!(data.status, Status::error("boom"));
    assert_eq!(data.events.events.len(), 1);
    assert_eq!(data.events.events[0].name, "exception");
}

#[test]
fn store_flags_records_attributes_and_redacts_secrets() {
    let (provider, exporter) = recording_provider();
    let group = FlagGroup::new("Test")
        .arg(Arg::new("project").long("project"))
        .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
        .secret(Arg::new("token").long("token"));
    let parsed = combine_flags(&[group])
        .parse(["--project", "web", "--token", "s3cr3t"])
        .expect("parse");

    let mut span = provider
        .tracer("t")
        .start_with_context("op", Context::background().otel());
    let ctx = store_flags(&Context::background(), &mut span, parsed);
    span.end();

    assert_eq!(
        ctx.flags().and_then(|f| f.get_str("project")),
        Some("web")
    );

    let data = span_named(&exporter, "op");
    assert_eq!(attr(&data, "flag.project").as_deref(), Some("web"));
    assert_eq!(attr(&data, "flag.verbose").as_deref(), Some("false"));
    assert_eq!(attr(&data, "flag.token").as_deref(), Some("[redacted]"));
}

#[test]
fn resource_names_the_service() {
    let resource = resource();
    let value = |key: &'static str| {
        resource
            .get(&opentelemetry::Key::from_static_str(key))
            .map(|v| v.as_str().into_owned())
    };
    assert_eq!(value("service.name").as_deref(), Some("flagon"));
    assert_eq!(
        value("service.version").as_deref(),
        Some(env!("CARGO_PKG_VERSION"))
    );
}

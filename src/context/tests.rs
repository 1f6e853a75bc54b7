use super::*;
use crate::cli::flags::{FlagGroup, combine_flags};
use crate::error::FlagonError;
use clap::Arg;
use opentelemetry::trace::{TraceContextExt, Tracer, TracerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;

#[test]
fn background_context_is_live() {
    let ctx = Context::background();
    assert!(ctx.check().is_ok());
    assert!(ctx.remaining().is_none());
    assert!(!ctx.span_context().is_valid());
    assert!(ctx.flags().is_none());
}

#[test]
fn cancellation_is_shared_with_derived_contexts() {
    let token = CancellationToken::new();
    let ctx = Context::background().with_cancellation(token.clone());
    let child = ctx.with_timeout(Duration::from_secs(60));

    token.cancel();

    assert!(matches!(child.check(), Err(FlagonError::Cancelled)));
}

#[test]
fn expired_deadline_fails_check() {
    let ctx = Context::background().with_deadline(Instant::now());
    assert!(matches!(ctx.check(), Err(FlagonError::DeadlineExceeded)));
}

#[test]
fn later_deadline_does_not_extend_earlier_one() {
    let ctx = Context::background().with_timeout(Duration::from_secs(1));
    let child = ctx.with_timeout(Duration::from_secs(3600));
    let left = child.remaining().expect("deadline");
    assert!(left <= Duration::from_secs(1));
}

#[test]
fn with_span_makes_span_active() {
    let provider = SdkTracerProvider::builder().build();
    let span = provider.tracer("t").start("op");

    let ctx = Context::background().with_span(&span);

    assert!(ctx.span_context().is_valid());
    assert_eq!(ctx.span_context().span_id(), span.span_context().span_id());
    assert!(ctx.otel().has_active_span());
}

#[test]
fn flags_survive_later_derivations() {
    let parsed = combine_flags(&[FlagGroup::new("Test").arg(Arg::new("project").long("project"))])
        .parse(["--project", "web"])
        .expect("parse");

    let ctx = Context::background()
        .with_flags(parsed)
        .with_timeout(Duration::from_secs(5));

    assert_eq!(ctx.flags().and_then(|f| f.get_str("project")), Some("web"));
}

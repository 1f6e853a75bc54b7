//! # Tracing
//!
//! OpenTelemetry spans for one CLI invocation.
//!
//! The [`SdkTracerProvider`] is built once in `main` and handed to every
//! [`Meta`](crate::cli::meta::Meta); nothing here registers or reads a global
//! provider. Each command gets a tracer named after it. Spans started from a
//! [`Context`] become children of the span the context carries. When the
//! process was started with a `TRACEPARENT` value, [`with_trace_parent`]
//! makes the first span a child of that remote trace.

use crate::cli::flags::ParsedFlags;
use crate::context::Context;
use crate::project_identity;
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{Span, Status, TraceContextExt};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::collections::HashMap;

/// Carrier key the W3C propagator reads.
const TRACEPARENT_KEY: &str = "traceparent";

/// Describes this process: `service.name`, `service.version`, `host.name`.
pub fn resource() -> Resource {
    let mut attributes = vec![KeyValue::new(
        "service.version",
        env!("CARGO_PKG_VERSION"),
    )];
    if let Some(host) = hostname::get().ok().and_then(|h| h.into_string().ok()) {
        attributes.push(KeyValue::new("host.name", host));
    }

    Resource::builder()
        .with_service_name(project_identity::BINARY_NAME)
        .with_attributes(attributes)
        .build()
}

/// Provider used by the binary. Spans are sampled and propagated; no
/// exporter is attached.
pub fn provider() -> SdkTracerProvider {
    SdkTracerProvider::builder().with_resource(resource()).build()
}

/// Continue the trace described by `token` (a `traceparent` value).
///
/// An empty or malformed token leaves the context unchanged, so the next span
/// starts a new trace.
pub fn with_trace_parent(ctx: &Context, token: &str) -> Context {
    let token = token.trim();
    if token.is_empty() {
        return ctx.clone();
    }
    if !is_well_formed(token) {
        tracing::debug!(traceparent = %token, "ignoring malformed trace parent");
        return ctx.clone();
    }

    let carrier = HashMap::from([(TRACEPARENT_KEY.to_string(), token.to_string())]);
    let extracted = TraceContextPropagator::new().extract_with_context(ctx.otel(), &carrier);
    let remote = extracted.span().span_context().clone();

    if remote.is_valid() && remote.is_remote() {
        ctx.with_otel(extracted)
    } else {
        tracing::debug!(traceparent = %token, "ignoring invalid trace parent");
        ctx.clone()
    }
}

/// Lowercase hex fields of the right length, version not `ff`, and no
/// trailing fields for version `00`.
///
/// The propagator parses ids with `from_str_radix`, which also takes a
/// leading `+`; this check runs first so such values never become parents.
fn is_well_formed(token: &str) -> bool {
    let parts: Vec<&str> = token.split('-').collect();
    if parts.len() < 4 {
        return false;
    }
    let is_hex = |s: &str, len: usize| {
        s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    };

    let version = parts[0];
    is_hex(version, 2)
        && version != "ff"
        && (version != "00" || parts.len() == 4)
        && is_hex(parts[1], 32)
        && is_hex(parts[2], 16)
        && is_hex(parts[3], 2)
}

/// Attach the parsed flags to the context for downstream spans, and record
/// them on `span` as `flag.<name>` attributes. Secret values are redacted.
pub fn store_flags<S: Span>(ctx: &Context, span: &mut S, flags: ParsedFlags) -> Context {
    for (name, value) in flags.attributes() {
        span.set_attribute(KeyValue::new(format!("flag.{}", name), value));
    }
    ctx.with_flags(flags)
}

/// Add an `exception` event for `err` and mark the span failed.
pub fn record_error<S: Span>(span: &mut S, err: &dyn std::error::Error) {
    span.record_error(err);
    span.set_status(Status::error(err.to_string()));
}

#[cfg(test)]
mod tests;

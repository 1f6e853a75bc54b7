use crate::cli::flags::ParsedFlags;
use crate::error::{FlagonError, Result};
use opentelemetry::trace::{Span, SpanContext, TraceContextExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Request-scoped state passed explicitly down the call chain.
///
/// The active span and the parsed flags travel in an
/// [`opentelemetry::Context`]; cancellation and the deadline sit beside it.
/// `with_*` methods return a derived copy; the receiver is never modified.
#[derive(Debug, Clone, Default)]
pub struct Context {
    otel: opentelemetry::Context,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    /// Derive a context that expires at `deadline`, or at the existing
    /// deadline if that one is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn otel(&self) -> &opentelemetry::Context {
        &self.otel
    }

    pub fn with_otel(&self, otel: opentelemetry::Context) -> Self {
        Self {
            otel,
            ..self.clone()
        }
    }

    /// Spans started from the derived context become children of `span`.
    pub fn with_span<S: Span>(&self, span: &S) -> Self {
        self.with_otel(
            self.otel
                .with_remote_span_context(span.span_context().clone()),
        )
    }

    pub fn with_flags(&self, flags: ParsedFlags) -> Self {
        self.with_otel(self.otel.with_value(flags))
    }

    /// Context of the active span. Invalid when no span was attached.
    pub fn span_context(&self) -> SpanContext {
        self.otel.span().span_context().clone()
    }

    pub fn flags(&self) -> Option<&ParsedFlags> {
        self.otel.get::<ParsedFlags>()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline. `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the context was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(FlagonError::Cancelled);
        }
        if self.remaining().is_some_and(|left| left.is_zero()) {
            return Err(FlagonError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

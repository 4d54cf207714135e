//! Per-invocation span carrying the command label and trace identifier.

use tracing::Span;

use crate::init::build_sha;

/// Span wrapping one CLI command so every log line carries its trace identifier.
#[derive(Debug, Clone)]
pub struct CommandSpan {
    span: Span,
}

impl CommandSpan {
    /// Create the span for `command`.
    #[must_use]
    pub fn new(command: &'static str, trace_id: &str) -> Self {
        let span = tracing::info_span!(
            "command",
            command = command,
            trace_id = %trace_id,
            build_sha = %build_sha()
        );
        Self { span }
    }

    /// Run `operation` with the span entered.
    pub fn in_scope<T>(&self, operation: impl FnOnce() -> T) -> T {
        self.span.in_scope(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_scope_returns_operation_result() {
        let span = CommandSpan::new("install", "trace-1");
        assert_eq!(span.in_scope(|| 41 + 1), 42);
    }
}

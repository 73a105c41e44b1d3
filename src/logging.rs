use std::fmt;

/// Request-scoped logging handle used while binding.
///
/// Every event carries the request id of the [`BindSource`] being bound,
/// so the trace of one request can be followed through default injection,
/// extraction and validation.
///
/// Field values are never logged, only field names and counts: request
/// inputs may hold credentials.
///
/// [`BindSource`]: crate::web::BindSource
#[derive(Debug, Clone, Copy)]
pub struct BindLog<'a> {
    request_id: &'a str,
}

impl<'a> BindLog<'a> {
    /// Request id used when the source does not supply one.
    pub const ANONYMOUS: &'static str = "-";

    /// Creates a handle for the given request.
    pub(crate) fn new(request_id: Option<&'a str>) -> Self {
        Self {
            request_id: request_id.unwrap_or(Self::ANONYMOUS),
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs a debug-level message with request ID.
    ///
    /// ```no_run
    /// # use bind_core::BindLog;
    /// # fn example(log: &BindLog<'_>) {
    /// log.debug(format_args!("bound {} fields", 3));
    /// # }
    /// ```
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a trace-level message with request ID.
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        tracing::trace!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a warning-level message with request ID.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }
}

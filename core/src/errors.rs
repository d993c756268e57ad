//! Application-level error model.
//!
//! [`ApiError`] is the tagged application error surfaced by clients and
//! services. It carries a coarse [`Fault`] classification plus the retry
//! metadata (retry safety, throttling, retry-after hint) that higher
//! layers use to decide recovery.

use std::{
    backtrace::Backtrace,
    error::Error,
    fmt::{self, Display, Formatter},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::schema::SchemaRef;
use crate::schema::prelude::{ErrorFault, ErrorTrait, HttpErrorTrait};

static CAPTURE_STACK_TRACES: AtomicBool = AtomicBool::new(false);

/// Globally enable or disable stack trace capture for [`ApiError`]s.
///
/// Capture is disabled by default. Errors constructed while capture is
/// disabled report no backtrace unless a per-construction override is
/// provided via [`ApiError::with_stack_trace`].
pub fn capture_stack_traces(enabled: bool) {
    CAPTURE_STACK_TRACES.store(enabled, Ordering::Relaxed);
}

/// Coarse classification of where the responsibility for an error lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The caller is at fault (e.g., invalid input).
    Client,
    /// The service is at fault (e.g., internal failure).
    Server,
    /// Responsibility cannot be determined.
    Other,
}

impl Fault {
    /// Classify a fault from an HTTP status code.
    #[must_use]
    pub const fn of_http_status(status: u16) -> Fault {
        match status {
            400..=499 => Fault::Client,
            500..=599 => Fault::Server,
            _ => Fault::Other,
        }
    }
}

/// Tri-state answer to "is it safe to retry the call that produced this error?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrySafety {
    Yes,
    No,
    #[default]
    Maybe,
}

/// Application error with fault classification and retry metadata.
#[derive(Debug)]
pub struct ApiError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
    fault: Fault,
    retry_safe: RetrySafety,
    throttle: bool,
    retry_after: Option<Duration>,
    backtrace: Option<Backtrace>,
}

impl ApiError {
    /// Create a new error with an undetermined fault.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_fault(message, Fault::Other)
    }

    /// Create a new error with an explicit fault classification.
    #[must_use]
    pub fn with_fault(message: impl Into<String>, fault: Fault) -> Self {
        let backtrace = if CAPTURE_STACK_TRACES.load(Ordering::Relaxed) {
            Some(Backtrace::force_capture())
        } else {
            None
        };
        ApiError {
            message: message.into(),
            source: None,
            fault,
            retry_safe: RetrySafety::Maybe,
            throttle: false,
            retry_after: None,
            backtrace,
        }
    }

    /// Create a new error, overriding the global stack trace toggle.
    #[must_use]
    pub fn with_stack_trace(message: impl Into<String>, capture: bool) -> Self {
        let mut error = Self::new(message);
        error.backtrace = if capture {
            Some(Backtrace::force_capture())
        } else {
            None
        };
        error
    }

    /// Create a new error classified from an HTTP status code.
    #[must_use]
    pub fn of_http_status(message: impl Into<String>, status: u16) -> Self {
        Self::with_fault(message, Fault::of_http_status(status))
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn fault(&self) -> Fault {
        self.fault
    }

    #[must_use]
    pub const fn is_retry_safe(&self) -> RetrySafety {
        self.retry_safe
    }

    #[must_use]
    pub const fn is_throttle(&self) -> bool {
        self.throttle
    }

    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    #[must_use]
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }

    /// Update retry safety.
    ///
    /// Marking an error retry-unsafe clears the retry-after hint and the
    /// throttle flag: both only make sense for calls that may be retried.
    pub fn set_retry_safe(&mut self, retry_safe: RetrySafety) {
        self.retry_safe = retry_safe;
        if retry_safe == RetrySafety::No {
            self.retry_after = None;
            self.throttle = false;
        }
    }

    pub fn set_throttle(&mut self, throttle: bool) {
        self.throttle = throttle;
    }

    pub fn set_retry_after(&mut self, retry_after: Duration) {
        self.retry_after = Some(retry_after);
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn Error + 'static))
    }
}

/// An [`ApiError`] tied to a modeled error shape.
///
/// The schema's `@httpError` (or `@error`) trait determines the default
/// HTTP status reported for this error.
#[derive(Debug)]
pub struct ModeledApiError {
    error: ApiError,
    schema: SchemaRef,
}

impl ModeledApiError {
    #[must_use]
    pub fn new(message: impl Into<String>, schema: SchemaRef) -> Self {
        let fault = match schema.get_trait_as::<ErrorTrait>() {
            Some(error_trait) => match error_trait.fault() {
                ErrorFault::Client => Fault::Client,
                ErrorFault::Server => Fault::Server,
            },
            None => Fault::Server,
        };
        ModeledApiError {
            error: ApiError::with_fault(message, fault),
            schema,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The HTTP status code modeled for this error.
    ///
    /// `@httpError` wins over the `@error` fault default; errors with
    /// neither trait report 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if let Some(http_error) = self.schema.get_trait_as::<HttpErrorTrait>() {
            return http_error.code();
        }
        match self.schema.get_trait_as::<ErrorTrait>() {
            Some(error_trait) => match error_trait.fault() {
                ErrorFault::Client => 400,
                ErrorFault::Server => 500,
            },
            None => 500,
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &ApiError {
        &self.error
    }

    pub fn inner_mut(&mut self) -> &mut ApiError {
        &mut self.error
    }
}

impl Display for ModeledApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for ModeledApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}

//! Binding outcomes and the binding error taxonomy.
//!
//! A [`BindingResult`] is the tri-state outcome of a single argument-binding
//! attempt: satisfied with a value, unsatisfied (possibly with recorded
//! conversion errors), or pending on an asynchronous value. Pending results
//! expose whether they are still pending so the engine can decide whether to
//! retry at execute time.

use crate::argument::{Argument, ArgumentValue};
use crate::convert::ConversionError;
use crate::promise::Promise;
use thiserror::Error;

/// The outcome of one argument-binding attempt.
#[derive(Debug, Clone)]
pub enum BindingResult {
    /// The binder produced a value.
    Satisfied(ArgumentValue),
    /// No value could be produced; any conversion errors encountered are
    /// carried so they can take precedence over an unsatisfied failure.
    Unsatisfied(Vec<ConversionError>),
    /// The value is being produced asynchronously.
    Pending(PendingBinding),
}

impl BindingResult {
    /// A satisfied result carrying a value.
    #[must_use]
    pub fn satisfied(value: ArgumentValue) -> Self {
        Self::Satisfied(value)
    }

    /// An unsatisfied result with no recorded errors.
    #[must_use]
    pub fn unsatisfied() -> Self {
        Self::Unsatisfied(Vec::new())
    }

    /// An unsatisfied result carrying a conversion error.
    #[must_use]
    pub fn conversion_error(error: ConversionError) -> Self {
        Self::Unsatisfied(vec![error])
    }

    /// Returns true if the result is satisfied with a present (non-null)
    /// value.
    #[must_use]
    pub fn is_present_and_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(value) if !value.is_null())
    }

    /// Returns the conversion errors recorded on an unsatisfied result.
    #[must_use]
    pub fn conversion_errors(&self) -> &[ConversionError] {
        match self {
            Self::Unsatisfied(errors) => errors,
            _ => &[],
        }
    }
}

/// Outcome carried by a pending binding once its producer finishes.
pub type PendingOutcome = Result<ArgumentValue, ConversionError>;

/// Handle to an asynchronously produced binding value.
///
/// Wraps the one-shot promise the producing task completes; the engine polls
/// it at execute time rather than blocking on it. A producer that fails
/// completes the promise with the failure, so the error is never silently
/// swallowed.
#[derive(Debug, Clone)]
pub struct PendingBinding {
    promise: Promise<PendingOutcome>,
}

impl PendingBinding {
    /// Creates a pending binding over a promise.
    #[must_use]
    pub fn new(promise: Promise<PendingOutcome>) -> Self {
        Self { promise }
    }

    /// Returns true while the outcome is not yet available.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.promise.is_complete()
    }

    /// Returns the outcome if it has become available.
    #[must_use]
    pub fn try_outcome(&self) -> Option<PendingOutcome> {
        self.promise.try_get()
    }

    /// Waits for the outcome to become available.
    pub async fn resolved(&self) -> PendingOutcome {
        self.promise.resolved().await
    }
}

/// A request-level binding failure.
///
/// `Conversion` takes precedence over `Unsatisfied` whenever both could
/// apply: a value that was present but malformed is a more specific failure
/// than a value that was never supplied.
#[derive(Debug, Error)]
pub enum BindError {
    /// A required, non-nullable argument has no value after all resolution
    /// phases.
    #[error("required argument [{argument}] not specified")]
    Unsatisfied {
        /// The argument's declared name.
        argument: String,
    },

    /// A value was present but could not be coerced to the declared type.
    #[error("failed to convert argument [{argument}]: {source}")]
    Conversion {
        /// The argument's declared name.
        argument: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// The request stream feeding an argument failed before completion.
    #[error("request stream failed while binding argument [{argument}]")]
    Upstream {
        /// The argument's declared name.
        argument: String,
        /// The underlying stream failure.
        #[source]
        source: std::io::Error,
    },
}

impl BindError {
    /// An unsatisfied-argument failure for the given argument.
    #[must_use]
    pub fn unsatisfied(argument: &Argument) -> Self {
        Self::Unsatisfied {
            argument: argument.name().to_string(),
        }
    }

    /// A conversion failure for the given argument.
    #[must_use]
    pub fn conversion(argument: &Argument, source: ConversionError) -> Self {
        Self::Conversion {
            argument: argument.name().to_string(),
            source,
        }
    }

    /// An upstream-stream failure for the given argument.
    #[must_use]
    pub fn upstream(argument: &Argument, source: std::io::Error) -> Self {
        Self::Upstream {
            argument: argument.name().to_string(),
            source,
        }
    }
}

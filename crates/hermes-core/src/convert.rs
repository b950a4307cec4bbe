//! Value conversion between runtime values and declared argument types.
//!
//! The [`ConversionService`] contract mirrors what the binding engine
//! consumes: attempt a coercion with the argument's full type context, and
//! record a structured [`ConversionError`] on failure so the caller can
//! distinguish "no value" from "bad value".

use crate::argument::{Argument, ArgumentValue, TypeSpec};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A structured conversion failure.
///
/// Carries a human-readable message and, where the failure originated in a
/// parser, the underlying cause.
#[derive(Debug, Clone)]
pub struct ConversionError {
    message: String,
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ConversionError {
    /// Creates a conversion error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Per-attempt conversion context for one argument.
///
/// Created fresh for each binding attempt; records conversion errors so the
/// engine can propagate a conversion failure in preference to an
/// unsatisfied-argument failure.
#[derive(Debug)]
pub struct ConversionContext {
    argument: Argument,
    errors: Vec<ConversionError>,
}

impl ConversionContext {
    /// Creates a context for the given argument.
    #[must_use]
    pub fn of(argument: &Argument) -> Self {
        Self {
            argument: argument.clone(),
            errors: Vec::new(),
        }
    }

    /// Returns the argument under conversion.
    #[must_use]
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// Records a conversion error.
    pub fn reject(&mut self, error: ConversionError) {
        self.errors.push(error);
    }

    /// Returns true if any conversion error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the most recent conversion error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&ConversionError> {
        self.errors.last()
    }

    /// Removes and returns the most recent conversion error, if any.
    pub fn take_last_error(&mut self) -> Option<ConversionError> {
        self.errors.pop()
    }
}

/// Converts runtime values to declared argument types.
pub trait ConversionService: Send + Sync {
    /// Attempts to convert `value` to the target argument's type.
    ///
    /// Returns `None` on failure; a structured error describing why is
    /// recorded on the context unless the value was simply absent.
    fn convert(
        &self,
        value: ArgumentValue,
        target: &Argument,
        ctx: &mut ConversionContext,
    ) -> Option<ArgumentValue>;
}

/// The default coercion matrix.
///
/// Handles identity conversions, scalar parsing from strings, JSON
/// bridging, and byte/string round trips. Stream and upload values convert
/// only to their own types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConversionService;

impl DefaultConversionService {
    /// Creates a new default conversion service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn reject_mismatch(
        ctx: &mut ConversionContext,
        value: &ArgumentValue,
        target: &TypeSpec,
    ) {
        ctx.reject(ConversionError::new(format!(
            "cannot convert {value:?} to {target:?}"
        )));
    }
}

impl ConversionService for DefaultConversionService {
    #[allow(clippy::too_many_lines)]
    fn convert(
        &self,
        value: ArgumentValue,
        target: &Argument,
        ctx: &mut ConversionContext,
    ) -> Option<ArgumentValue> {
        let spec = target.type_spec();
        // Absent values never convert; the caller decides what absence means.
        if value.is_null() {
            return None;
        }
        if value.is_instance_of(spec) {
            return Some(value);
        }
        match spec {
            TypeSpec::Str => match value {
                ArgumentValue::Bool(b) => Some(ArgumentValue::Str(b.to_string())),
                ArgumentValue::Int(i) => Some(ArgumentValue::Str(i.to_string())),
                ArgumentValue::Float(f) => Some(ArgumentValue::Str(f.to_string())),
                ArgumentValue::Uuid(u) => Some(ArgumentValue::Str(u.to_string())),
                ArgumentValue::Json(serde_json::Value::String(s)) => Some(ArgumentValue::Str(s)),
                ArgumentValue::Bytes(b) => match String::from_utf8(b.to_vec()) {
                    Ok(s) => Some(ArgumentValue::Str(s)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new("request bytes are not valid UTF-8")
                                .with_cause(e),
                        );
                        None
                    }
                },
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Int => match value {
                ArgumentValue::Str(s) => match s.parse::<i64>() {
                    Ok(i) => Some(ArgumentValue::Int(i)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new(format!("'{s}' is not a valid integer"))
                                .with_cause(e),
                        );
                        None
                    }
                },
                ArgumentValue::Json(serde_json::Value::Number(n)) if n.as_i64().is_some() => {
                    Some(ArgumentValue::Int(n.as_i64().unwrap_or_default()))
                }
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Float => match value {
                ArgumentValue::Str(s) => match s.parse::<f64>() {
                    Ok(f) => Some(ArgumentValue::Float(f)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new(format!("'{s}' is not a valid number"))
                                .with_cause(e),
                        );
                        None
                    }
                },
                ArgumentValue::Int(i) => Some(ArgumentValue::Float(i as f64)),
                ArgumentValue::Json(serde_json::Value::Number(n)) if n.as_f64().is_some() => {
                    Some(ArgumentValue::Float(n.as_f64().unwrap_or_default()))
                }
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Bool => match value {
                ArgumentValue::Str(s) => match s.parse::<bool>() {
                    Ok(b) => Some(ArgumentValue::Bool(b)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new(format!("'{s}' is not a valid boolean"))
                                .with_cause(e),
                        );
                        None
                    }
                },
                ArgumentValue::Json(serde_json::Value::Bool(b)) => Some(ArgumentValue::Bool(b)),
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Uuid => match value {
                ArgumentValue::Str(s) => match Uuid::parse_str(&s) {
                    Ok(u) => Some(ArgumentValue::Uuid(u)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new(format!("'{s}' is not a valid UUID"))
                                .with_cause(e),
                        );
                        None
                    }
                },
                ArgumentValue::Json(serde_json::Value::String(s)) => {
                    self.convert(ArgumentValue::Str(s), target, ctx)
                }
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Json => match value {
                ArgumentValue::Bool(b) => Some(ArgumentValue::Json(b.into())),
                ArgumentValue::Int(i) => Some(ArgumentValue::Json(i.into())),
                ArgumentValue::Float(f) => Some(ArgumentValue::Json(
                    serde_json::Number::from_f64(f)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number),
                )),
                ArgumentValue::Str(s) => match serde_json::from_str(&s) {
                    Ok(v) => Some(ArgumentValue::Json(v)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new("string is not valid JSON").with_cause(e),
                        );
                        None
                    }
                },
                ArgumentValue::Bytes(b) => match serde_json::from_slice(&b) {
                    Ok(v) => Some(ArgumentValue::Json(v)),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new("request body is not valid JSON").with_cause(e),
                        );
                        None
                    }
                },
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::Bytes => match value {
                ArgumentValue::Str(s) => Some(ArgumentValue::Bytes(s.into_bytes().into())),
                ArgumentValue::CompletedUpload(upload) => {
                    Some(ArgumentValue::Bytes(upload.data().clone()))
                }
                ArgumentValue::Json(v) => match serde_json::to_vec(&v) {
                    Ok(bytes) => Some(ArgumentValue::Bytes(bytes.into())),
                    Err(e) => {
                        ctx.reject(
                            ConversionError::new("JSON value is not serializable").with_cause(e),
                        );
                        None
                    }
                },
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::List(_) => match value {
                ArgumentValue::Json(v @ serde_json::Value::Array(_)) => {
                    Some(ArgumentValue::Json(v))
                }
                other => {
                    Self::reject_mismatch(ctx, &other, spec);
                    None
                }
            },
            TypeSpec::StreamingUpload | TypeSpec::CompletedUpload | TypeSpec::Stream(_) => {
                // Identity-only types; instance check above already failed.
                Self::reject_mismatch(ctx, &value, spec);
                None
            }
        }
    }
}

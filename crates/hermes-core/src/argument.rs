//! Declared-argument descriptors and runtime argument values.
//!
//! An [`Argument`] describes one parameter of a route handler signature:
//! its name, semantic type, how it should be sourced from a request, and
//! whether the handler tolerates its absence. Descriptors are built once at
//! route-table construction time and shared immutably across requests.
//!
//! An [`ArgumentValue`] is the runtime value bound into a slot for one
//! request. The enum is closed: every value a binder can produce has an
//! explicit variant, so downstream matches are exhaustive.

use crate::multipart::{CompletedFileUpload, StreamingFileUpload};
use crate::stream::BodyStream;
use bytes::Bytes;
use uuid::Uuid;

/// Semantic type of a declared argument.
///
/// `Stream` and `List` are parameterized container types; everything else is
/// a plain value type.
///
/// # Example
///
/// ```rust
/// use hermes_core::TypeSpec;
///
/// let spec = TypeSpec::Stream(Box::new(TypeSpec::Json));
/// assert!(spec.is_container());
/// assert!(spec.type_param().is_some());
/// assert!(!TypeSpec::Int.is_container());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// Boolean value.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// UTF-8 string.
    Str,
    /// UUID value.
    Uuid,
    /// Arbitrary JSON value.
    Json,
    /// Raw bytes.
    Bytes,
    /// A streaming multipart file upload handle.
    StreamingUpload,
    /// A fully buffered multipart file upload.
    CompletedUpload,
    /// A stream of elements of the inner type.
    Stream(Box<TypeSpec>),
    /// A list of elements of the inner type.
    List(Box<TypeSpec>),
}

impl TypeSpec {
    /// Returns true if this is a parameterized container type.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::List(_))
    }

    /// Returns the element type parameter for container types.
    #[must_use]
    pub fn type_param(&self) -> Option<&TypeSpec> {
        match self {
            Self::Stream(inner) | Self::List(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Where an argument's value is sourced from in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// Query string parameter.
    Query,
    /// HTTP header.
    Header,
    /// Request body.
    Body,
    /// Named multipart part.
    Part,
    /// A value derived from the whole request.
    RequestBean,
}

/// One declared argument of a route handler signature.
///
/// Carries the metadata the binding engine needs: the parameter name, the
/// semantic type, an optional explicit bind name (overriding the parameter
/// name when matching request inputs), an optional binding source, and the
/// nullability flags.
///
/// # Example
///
/// ```rust
/// use hermes_core::{Argument, BindingSource, TypeSpec};
///
/// let arg = Argument::new("user_id", TypeSpec::Int)
///     .from_source(BindingSource::Query)
///     .with_bind_name("userId");
///
/// assert_eq!(arg.name(), "user_id");
/// assert_eq!(arg.bind_name(), Some("userId"));
/// assert!(!arg.is_nullable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    name: String,
    type_spec: TypeSpec,
    bind_name: Option<String>,
    source: Option<BindingSource>,
    nullable: bool,
    optional: bool,
}

impl Argument {
    /// Creates a new required argument descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
            bind_name: None,
            source: None,
            nullable: false,
            optional: false,
        }
    }

    /// Sets an explicit bind name, as a bind annotation would.
    ///
    /// An empty string is ignored when resolving the input name.
    #[must_use]
    pub fn with_bind_name(mut self, bind_name: impl Into<String>) -> Self {
        self.bind_name = Some(bind_name.into());
        self
    }

    /// Sets the binding source for this argument.
    #[must_use]
    pub fn from_source(mut self, source: BindingSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Marks the argument as declared nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the argument as optional-wrapped.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Returns the declared parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic type.
    #[must_use]
    pub fn type_spec(&self) -> &TypeSpec {
        &self.type_spec
    }

    /// Returns the explicit bind name, if one was declared.
    ///
    /// This is the annotation-metadata accessor: it reports exactly what was
    /// declared, including an empty string.
    #[must_use]
    pub fn bind_name(&self) -> Option<&str> {
        self.bind_name.as_deref()
    }

    /// Returns the binding source, if one was declared.
    #[must_use]
    pub fn source(&self) -> Option<BindingSource> {
        self.source
    }

    /// Returns the resolved input name: the explicit bind name when present
    /// and non-empty, else the declared parameter name.
    #[must_use]
    pub fn input_name(&self) -> &str {
        match self.bind_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }

    /// Returns true if the argument is declared nullable.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns true if the argument is optional-wrapped.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns true if the declared type is a parameterized container.
    #[must_use]
    pub fn is_container_type(&self) -> bool {
        self.type_spec.is_container()
    }

    /// Returns true if the declared type carries type parameters.
    #[must_use]
    pub fn has_type_params(&self) -> bool {
        self.type_spec.type_param().is_some()
    }
}

/// A runtime value bound to one argument slot.
///
/// Stream-like variants (`Upload`, `Stream`) clone by sharing the underlying
/// channel handle; the data itself remains single-consumer.
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    /// Absent value for a nullable argument.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Str(String),
    /// UUID value.
    Uuid(Uuid),
    /// JSON value.
    Json(serde_json::Value),
    /// Raw bytes.
    Bytes(Bytes),
    /// Streaming file upload handle.
    Upload(StreamingFileUpload),
    /// Fully buffered file upload.
    CompletedUpload(CompletedFileUpload),
    /// Stream of converted body elements.
    Stream(BodyStream),
}

impl ArgumentValue {
    /// Returns true if this is the null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value is already an instance of the given type.
    #[must_use]
    pub fn is_instance_of(&self, spec: &TypeSpec) -> bool {
        match spec {
            TypeSpec::Bool => matches!(self, Self::Bool(_)),
            TypeSpec::Int => matches!(self, Self::Int(_)),
            TypeSpec::Float => matches!(self, Self::Float(_)),
            TypeSpec::Str => matches!(self, Self::Str(_)),
            TypeSpec::Uuid => matches!(self, Self::Uuid(_)),
            TypeSpec::Json => matches!(self, Self::Json(_)),
            TypeSpec::Bytes => matches!(self, Self::Bytes(_)),
            TypeSpec::StreamingUpload => matches!(self, Self::Upload(_)),
            TypeSpec::CompletedUpload => matches!(self, Self::CompletedUpload(_)),
            TypeSpec::Stream(_) => matches!(self, Self::Stream(_)),
            TypeSpec::List(_) => matches!(self, Self::Json(serde_json::Value::Array(_))),
        }
    }

    /// Returns the value as a string slice if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for ArgumentValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_defaults() {
        let arg = Argument::new("id", TypeSpec::Int);
        assert_eq!(arg.name(), "id");
        assert_eq!(arg.type_spec(), &TypeSpec::Int);
        assert!(arg.bind_name().is_none());
        assert!(arg.source().is_none());
        assert!(!arg.is_nullable());
        assert!(!arg.is_optional());
    }

    #[test]
    fn test_argument_builder_flags() {
        let arg = Argument::new("body", TypeSpec::Json)
            .from_source(BindingSource::Body)
            .nullable()
            .optional();

        assert_eq!(arg.source(), Some(BindingSource::Body));
        assert!(arg.is_nullable());
        assert!(arg.is_optional());
    }

    #[test]
    fn test_input_name_resolution() {
        let plain = Argument::new("userId", TypeSpec::Int);
        assert_eq!(plain.input_name(), "userId");

        let named = Argument::new("userId", TypeSpec::Int).with_bind_name("user-id");
        assert_eq!(named.input_name(), "user-id");

        let empty = Argument::new("userId", TypeSpec::Int).with_bind_name("");
        assert_eq!(empty.input_name(), "userId");
    }

    #[test]
    fn test_container_type_params() {
        let stream = Argument::new("chunks", TypeSpec::Stream(Box::new(TypeSpec::Bytes)));
        assert!(stream.is_container_type());
        assert!(stream.has_type_params());

        let plain = Argument::new("name", TypeSpec::Str);
        assert!(!plain.is_container_type());
        assert!(!plain.has_type_params());
    }

    #[test]
    fn test_is_instance_of() {
        assert!(ArgumentValue::Int(1).is_instance_of(&TypeSpec::Int));
        assert!(!ArgumentValue::Int(1).is_instance_of(&TypeSpec::Str));
        assert!(ArgumentValue::Json(serde_json::json!([1, 2]))
            .is_instance_of(&TypeSpec::List(Box::new(TypeSpec::Int))));
        assert!(!ArgumentValue::Json(serde_json::json!({"a": 1}))
            .is_instance_of(&TypeSpec::List(Box::new(TypeSpec::Int))));
    }

    #[test]
    fn test_value_conversions_from() {
        assert!(matches!(ArgumentValue::from("x"), ArgumentValue::Str(_)));
        assert!(matches!(ArgumentValue::from(7i64), ArgumentValue::Int(7)));
        assert!(matches!(ArgumentValue::from(true), ArgumentValue::Bool(true)));
    }
}

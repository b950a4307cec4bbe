//! Argument binder contract and the binder registry.
//!
//! A binder is a strategy that extracts one argument's value from a request.
//! Binders are classified by [`BinderKind`], a closed discriminant the
//! binding engine matches on exhaustively: ordinary binders and non-blocking
//! body binders apply immediately, blocking body binders and request-bean
//! binders are postponed to the final resolution pass.

use crate::bean::RequestBeanBinder;
use crate::body::JsonBodyBinder;
use crate::header::HeaderValueBinder;
use crate::publisher::StreamBodyBinder;
use crate::query::QueryValueBinder;
use crate::request::ServerRequest;
use crate::upload::{CompletedFileUploadBinder, StreamingFileUploadBinder};
use hermes_core::{
    Argument, ArgumentValue, BindingResult, BindingSource, ConversionContext, ConversionService,
    DefaultConversionService, TypeSpec,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Classification of a binder, driving when it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderKind {
    /// Applied immediately during the binder-application phase.
    Ordinary,
    /// A body binder that does not require the fully buffered body; applied
    /// immediately, though its result may still be pending.
    NonBlockingBody,
    /// A body binder that requires the fully materialized body; always
    /// postponed to execute time.
    BlockingBody,
    /// Derives a value from the whole request; postponed so that all simple
    /// bindings resolve first.
    RequestBean,
}

/// Extracts one argument's value from a request.
pub trait ArgumentBinder: Send + Sync {
    /// Returns the binder classification.
    fn kind(&self) -> BinderKind {
        BinderKind::Ordinary
    }

    /// Attempts to bind the context's argument from the request.
    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult;
}

/// Resolves the binder responsible for an argument.
pub trait RequestBinderRegistry: Send + Sync {
    /// Finds a binder for the argument, if any applies.
    fn find_argument_binder(&self, argument: &Argument) -> Option<Arc<dyn ArgumentBinder>>;
}

/// The default binder registry.
///
/// Resolution order: explicitly registered per-name binders, then the
/// argument's declared binding source, then the declared type for types that
/// imply a binder (uploads, streams).
///
/// # Example
///
/// ```rust
/// use hermes_bind::{BinderKind, DefaultBinderRegistry, RequestBinderRegistry};
/// use hermes_core::{Argument, BindingSource, TypeSpec};
///
/// let registry = DefaultBinderRegistry::new();
/// let body = Argument::new("payload", TypeSpec::Json).from_source(BindingSource::Body);
///
/// let binder = registry.find_argument_binder(&body).expect("body binder");
/// assert_eq!(binder.kind(), BinderKind::BlockingBody);
/// ```
pub struct DefaultBinderRegistry {
    conversion: Arc<dyn ConversionService>,
    by_name: HashMap<String, Arc<dyn ArgumentBinder>>,
}

impl DefaultBinderRegistry {
    /// Creates a registry backed by the default conversion service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_conversion_service(Arc::new(DefaultConversionService::new()))
    }

    /// Creates a registry backed by the given conversion service.
    #[must_use]
    pub fn with_conversion_service(conversion: Arc<dyn ConversionService>) -> Self {
        Self {
            conversion,
            by_name: HashMap::new(),
        }
    }

    /// Registers a binder that applies to arguments with the given resolved
    /// input name, taking precedence over source- and type-based resolution.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, binder: Arc<dyn ArgumentBinder>) -> Self {
        self.by_name.insert(name.into(), binder);
        self
    }

    fn source_binder(&self, argument: &Argument) -> Option<Arc<dyn ArgumentBinder>> {
        match argument.source()? {
            BindingSource::Query => Some(Arc::new(QueryValueBinder::new(Arc::clone(
                &self.conversion,
            )))),
            BindingSource::Header => Some(Arc::new(HeaderValueBinder::new(Arc::clone(
                &self.conversion,
            )))),
            BindingSource::Body => Some(self.body_binder(argument)),
            BindingSource::Part => self.part_binder(argument),
            BindingSource::RequestBean => Some(Arc::new(RequestBeanBinder::request_info())),
        }
    }

    fn body_binder(&self, argument: &Argument) -> Arc<dyn ArgumentBinder> {
        if matches!(argument.type_spec(), TypeSpec::Stream(_)) {
            Arc::new(StreamBodyBinder::new(Arc::clone(&self.conversion)))
        } else {
            Arc::new(JsonBodyBinder::new(Arc::clone(&self.conversion)))
        }
    }

    fn part_binder(&self, argument: &Argument) -> Option<Arc<dyn ArgumentBinder>> {
        match argument.type_spec() {
            TypeSpec::StreamingUpload => Some(Arc::new(StreamingFileUploadBinder::new())),
            TypeSpec::CompletedUpload | TypeSpec::Bytes => {
                Some(Arc::new(CompletedFileUploadBinder::new()))
            }
            _ => None,
        }
    }

    fn typed_binder(&self, argument: &Argument) -> Option<Arc<dyn ArgumentBinder>> {
        match argument.type_spec() {
            TypeSpec::StreamingUpload => Some(Arc::new(StreamingFileUploadBinder::new())),
            TypeSpec::CompletedUpload => Some(Arc::new(CompletedFileUploadBinder::new())),
            TypeSpec::Stream(_) => {
                Some(Arc::new(StreamBodyBinder::new(Arc::clone(&self.conversion))))
            }
            _ => None,
        }
    }
}

impl Default for DefaultBinderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBinderRegistry for DefaultBinderRegistry {
    fn find_argument_binder(&self, argument: &Argument) -> Option<Arc<dyn ArgumentBinder>> {
        if let Some(binder) = self.by_name.get(argument.input_name()) {
            return Some(Arc::clone(binder));
        }
        if argument.source().is_some() {
            return self.source_binder(argument);
        }
        self.typed_binder(argument)
    }
}

/// A binder wrapping a fixed binding function; useful for registering
/// one-off extraction strategies without a dedicated type.
pub struct FnBinder<F> {
    kind: BinderKind,
    func: F,
}

impl<F> FnBinder<F>
where
    F: Fn(&mut ConversionContext, &Arc<ServerRequest>) -> BindingResult + Send + Sync,
{
    /// Creates an ordinary function binder.
    #[must_use]
    pub fn new(func: F) -> Self {
        Self {
            kind: BinderKind::Ordinary,
            func,
        }
    }

    /// Creates a function binder with an explicit classification.
    #[must_use]
    pub fn with_kind(kind: BinderKind, func: F) -> Self {
        Self { kind, func }
    }
}

impl<F> ArgumentBinder for FnBinder<F>
where
    F: Fn(&mut ConversionContext, &Arc<ServerRequest>) -> BindingResult + Send + Sync,
{
    fn kind(&self) -> BinderKind {
        self.kind
    }

    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        (self.func)(ctx, request)
    }
}

/// Convenience constructor for a satisfied constant binder, used in tests
/// and for injecting fixed request-scoped values.
#[must_use]
pub fn constant_binder(value: ArgumentValue) -> Arc<dyn ArgumentBinder> {
    Arc::new(FnBinder::new(move |_, _| {
        BindingResult::satisfied(value.clone())
    }))
}

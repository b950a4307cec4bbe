//! Buffered body binder.

use crate::binder::{ArgumentBinder, BinderKind};
use crate::request::ServerRequest;
use hermes_core::{ArgumentValue, BindingResult, ConversionContext, ConversionService};
use std::sync::Arc;

/// Binds an argument from the fully buffered request body.
///
/// Classified as a blocking body binder: the engine never applies it during
/// the binder-application phase, because the body may not be fully received
/// yet, and instead defers it to execute time.
pub struct JsonBodyBinder {
    conversion: Arc<dyn ConversionService>,
}

impl JsonBodyBinder {
    /// Creates a buffered body binder.
    #[must_use]
    pub fn new(conversion: Arc<dyn ConversionService>) -> Self {
        Self { conversion }
    }
}

impl ArgumentBinder for JsonBodyBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::BlockingBody
    }

    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let Some(bytes) = request.body_bytes() else {
            return BindingResult::unsatisfied();
        };
        if bytes.is_empty() {
            return BindingResult::unsatisfied();
        }

        let target = ctx.argument().clone();
        match self
            .conversion
            .convert(ArgumentValue::Bytes(bytes.clone()), &target, ctx)
        {
            Some(value) => BindingResult::satisfied(value),
            None => BindingResult::unsatisfied(),
        }
    }
}

//! Request-bean binder.

use crate::binder::{ArgumentBinder, BinderKind};
use crate::request::ServerRequest;
use hermes_core::{ArgumentValue, BindingResult, ConversionContext};
use std::sync::Arc;

/// Binds a value derived from the whole request.
///
/// Classified as a request-bean binder: the engine postpones it to the final
/// resolution pass so all simple bindings resolve first.
pub struct RequestBeanBinder {
    factory: Arc<dyn Fn(&ServerRequest) -> BindingResult + Send + Sync>,
}

impl RequestBeanBinder {
    /// Creates a bean binder from a factory function.
    #[must_use]
    pub fn new(
        factory: impl Fn(&ServerRequest) -> BindingResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// The built-in request-info bean: method, path, and request id as a
    /// JSON object.
    #[must_use]
    pub fn request_info() -> Self {
        Self::new(|request| {
            BindingResult::satisfied(ArgumentValue::Json(serde_json::json!({
                "method": request.method().as_str(),
                "path": request.path(),
                "request_id": request.id(),
            })))
        })
    }
}

impl ArgumentBinder for RequestBeanBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::RequestBean
    }

    fn bind(&self, _ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        (self.factory)(request)
    }
}

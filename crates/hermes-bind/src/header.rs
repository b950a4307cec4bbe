//! HTTP header binder.

use crate::binder::ArgumentBinder;
use crate::request::ServerRequest;
use hermes_core::{ArgumentValue, BindingResult, ConversionContext, ConversionService};
use std::sync::Arc;

/// Binds an argument from an HTTP header.
///
/// The header is looked up by the argument's resolved input name.
pub struct HeaderValueBinder {
    conversion: Arc<dyn ConversionService>,
}

impl HeaderValueBinder {
    /// Creates a header value binder.
    #[must_use]
    pub fn new(conversion: Arc<dyn ConversionService>) -> Self {
        Self { conversion }
    }
}

impl ArgumentBinder for HeaderValueBinder {
    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let name = ctx.argument().input_name().to_string();
        let Some(raw) = request.header(&name) else {
            return BindingResult::unsatisfied();
        };

        let value = ArgumentValue::Str(raw.to_string());
        let target = ctx.argument().clone();
        match self.conversion.convert(value, &target, ctx) {
            Some(value) => BindingResult::satisfied(value),
            None => BindingResult::unsatisfied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Argument, DefaultConversionService, TypeSpec};
    use http::{Method, Uri};

    #[test]
    fn test_binds_header_by_input_name() {
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::GET)
                .uri(Uri::from_static("/"))
                .header("x-request-count", "3")
                .build(),
        );
        let binder = HeaderValueBinder::new(Arc::new(DefaultConversionService::new()));
        let argument = Argument::new("count", TypeSpec::Int).with_bind_name("x-request-count");

        let mut ctx = ConversionContext::of(&argument);
        let result = binder.bind(&mut ctx, &request);
        assert!(matches!(
            result,
            BindingResult::Satisfied(ArgumentValue::Int(3))
        ));
    }

    #[test]
    fn test_missing_header_is_unsatisfied() {
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::GET)
                .uri(Uri::from_static("/"))
                .build(),
        );
        let binder = HeaderValueBinder::new(Arc::new(DefaultConversionService::new()));
        let argument = Argument::new("authorization", TypeSpec::Str);

        let mut ctx = ConversionContext::of(&argument);
        assert!(matches!(
            binder.bind(&mut ctx, &request),
            BindingResult::Unsatisfied(_)
        ));
    }
}

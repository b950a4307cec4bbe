//! Query parameter binder.

use crate::binder::ArgumentBinder;
use crate::request::ServerRequest;
use hermes_core::{
    ArgumentValue, BindingResult, ConversionContext, ConversionError, ConversionService,
};
use std::sync::Arc;

/// Binds an argument from a query-string parameter.
///
/// The parameter is looked up by the argument's resolved input name; the raw
/// string value is then coerced to the declared type.
pub struct QueryValueBinder {
    conversion: Arc<dyn ConversionService>,
}

impl QueryValueBinder {
    /// Creates a query value binder.
    #[must_use]
    pub fn new(conversion: Arc<dyn ConversionService>) -> Self {
        Self { conversion }
    }
}

impl ArgumentBinder for QueryValueBinder {
    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let Some(query) = request.query_string() else {
            return BindingResult::unsatisfied();
        };
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                ctx.reject(ConversionError::new("malformed query string").with_cause(e));
                return BindingResult::unsatisfied();
            }
        };

        let name = ctx.argument().input_name().to_string();
        let Some((_, raw)) = pairs.into_iter().find(|(key, _)| *key == name) else {
            return BindingResult::unsatisfied();
        };

        let target = ctx.argument().clone();
        match self
            .conversion
            .convert(ArgumentValue::Str(raw), &target, ctx)
        {
            Some(value) => BindingResult::satisfied(value),
            None => BindingResult::unsatisfied(),
        }
    }
}

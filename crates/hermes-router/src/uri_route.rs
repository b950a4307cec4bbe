//! URI route dispatch.
//!
//! A [`UriRouteInfo`] pairs a route descriptor with an HTTP method and a
//! path template. A successful match constructs a [`RouteMatch`] with the
//! template's captured variables injected before argument binding proper.

use crate::route_info::RouteInfo;
use crate::route_match::{RouteMatch, VariableMap};
use crate::template::UriTemplate;
use hermes_bind::ServerRequest;
use hermes_core::{ArgumentValue, ConversionService};
use http::Method;
use std::sync::Arc;

/// A (method, path-template) route pointing at a handler signature.
///
/// # Example
///
/// ```rust
/// use hermes_router::{FnRouteHandler, RouteInfo, UriRouteInfo, UriTemplate};
/// use hermes_core::{Argument, ArgumentValue, DefaultConversionService, TypeSpec};
/// use http::Method;
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnRouteHandler::new(|_args| async move {
///     Ok(ArgumentValue::Null)
/// }));
/// let route = UriRouteInfo::new(
///     Method::GET,
///     UriTemplate::parse("/users/{id}").unwrap(),
///     RouteInfo::builder(handler)
///         .argument(Argument::new("id", TypeSpec::Int))
///         .build(),
///     Arc::new(DefaultConversionService::new()),
/// );
///
/// assert!(route.match_path("/users/42").is_some());
/// assert!(route.match_path("/teams/42").is_none());
/// ```
pub struct UriRouteInfo {
    method: Method,
    template: UriTemplate,
    route_info: Arc<RouteInfo>,
    conversion: Arc<dyn ConversionService>,
}

impl UriRouteInfo {
    /// Creates a URI route.
    #[must_use]
    pub fn new(
        method: Method,
        template: UriTemplate,
        route_info: Arc<RouteInfo>,
        conversion: Arc<dyn ConversionService>,
    ) -> Self {
        Self {
            method,
            template,
            route_info,
            conversion,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    /// Returns the route descriptor.
    #[must_use]
    pub fn route_info(&self) -> &Arc<RouteInfo> {
        &self.route_info
    }

    /// Matches a request path against the template.
    ///
    /// On success, the captured variables are injected into the returned
    /// binding session as string values; coercion to the declared argument
    /// types happens when the variables are fulfilled.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let params = self.template.match_path(path)?;
        let variables: VariableMap = params
            .iter()
            .map(|(name, value)| (name.to_string(), ArgumentValue::from(value)))
            .collect();
        Some(
            RouteMatch::new(Arc::clone(&self.route_info), Arc::clone(&self.conversion))
                .with_variables(variables),
        )
    }

    /// Matches a full request: method, predicates, then the path template.
    #[must_use]
    pub fn match_request(&self, request: &ServerRequest) -> Option<RouteMatch> {
        if request.method() != self.method || !self.route_info.matching(request) {
            return None;
        }
        self.match_path(request.path())
    }

    /// Orders routes by template specificity, most specific first.
    #[must_use]
    pub fn compare_specificity(&self, other: &Self) -> std::cmp::Ordering {
        self.template.compare_specificity(&other.template)
    }
}

impl std::fmt::Debug for UriRouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriRouteInfo")
            .field("method", &self.method)
            .field("template", &self.template.raw())
            .finish_non_exhaustive()
    }
}

//! Error- and status-route dispatch.
//!
//! These route infos participate in the "match family": a successful match
//! constructs a [`RouteMatch`] with the error or status injected as
//! variables, to be completed through the direct `invoke` path.

use crate::route_info::RouteInfo;
use crate::route_match::{RouteMatch, VariableMap};
use hermes_core::{ArgumentValue, ConversionService};
use http::StatusCode;
use std::sync::Arc;

/// A route handling a specific error type.
///
/// The matched error is exposed to the binding session as the `error` and
/// `message` variables.
///
/// # Example
///
/// ```rust
/// use hermes_router::{ErrorRouteInfo, FnRouteHandler, RouteInfo};
/// use hermes_core::{ArgumentValue, DefaultConversionService};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnRouteHandler::new(|_args| async move {
///     Ok(ArgumentValue::Null)
/// }));
/// let route = ErrorRouteInfo::for_error::<std::io::Error>(
///     RouteInfo::builder(handler).build(),
///     Arc::new(DefaultConversionService::new()),
/// );
///
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
/// assert!(route.match_error(&err).is_some());
/// assert!(route.match_error(&std::fmt::Error).is_none());
/// ```
pub struct ErrorRouteInfo {
    route_info: Arc<RouteInfo>,
    conversion: Arc<dyn ConversionService>,
    matcher: Arc<dyn Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync>,
}

impl ErrorRouteInfo {
    /// Creates an error route matching one concrete error type.
    #[must_use]
    pub fn for_error<E: std::error::Error + 'static>(
        route_info: Arc<RouteInfo>,
        conversion: Arc<dyn ConversionService>,
    ) -> Self {
        Self {
            route_info,
            conversion,
            matcher: Arc::new(|error| error.downcast_ref::<E>().is_some()),
        }
    }

    /// Returns the route descriptor.
    #[must_use]
    pub fn route_info(&self) -> &Arc<RouteInfo> {
        &self.route_info
    }

    /// Matches an error instance, constructing a binding session on success.
    #[must_use]
    pub fn match_error(&self, error: &(dyn std::error::Error + 'static)) -> Option<RouteMatch> {
        if !(self.matcher)(error) {
            return None;
        }
        let mut variables = VariableMap::new();
        let message = error.to_string();
        variables.insert("error".to_string(), ArgumentValue::Str(message.clone()));
        variables.insert("message".to_string(), ArgumentValue::Str(message));
        Some(
            RouteMatch::new(Arc::clone(&self.route_info), Arc::clone(&self.conversion))
                .with_variables(variables),
        )
    }
}

impl std::fmt::Debug for ErrorRouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRouteInfo")
            .field("route_info", &self.route_info)
            .finish_non_exhaustive()
    }
}

/// A route handling a specific HTTP status code.
///
/// The matched status is exposed to the binding session as the `status`
/// variable.
pub struct StatusRouteInfo {
    status: StatusCode,
    route_info: Arc<RouteInfo>,
    conversion: Arc<dyn ConversionService>,
}

impl StatusRouteInfo {
    /// Creates a status route.
    #[must_use]
    pub fn new(
        status: StatusCode,
        route_info: Arc<RouteInfo>,
        conversion: Arc<dyn ConversionService>,
    ) -> Self {
        Self {
            status,
            route_info,
            conversion,
        }
    }

    /// Returns the handled status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the route descriptor.
    #[must_use]
    pub fn route_info(&self) -> &Arc<RouteInfo> {
        &self.route_info
    }

    /// Matches a status code, constructing a binding session on success.
    #[must_use]
    pub fn match_status(&self, status: StatusCode) -> Option<RouteMatch> {
        if status != self.status {
            return None;
        }
        let mut variables = VariableMap::new();
        variables.insert(
            "status".to_string(),
            ArgumentValue::Int(i64::from(status.as_u16())),
        );
        Some(
            RouteMatch::new(Arc::clone(&self.route_info), Arc::clone(&self.conversion))
                .with_variables(variables),
        )
    }
}

impl std::fmt::Debug for StatusRouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRouteInfo")
            .field("status", &self.status)
            .field("route_info", &self.route_info)
            .finish_non_exhaustive()
    }
}

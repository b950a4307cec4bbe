//! Immutable per-route descriptors.
//!
//! A [`RouteInfo`] is built once at route-table construction time and shared
//! across every request matching that route. Argument order is fixed and
//! index-stable for the lifetime of the descriptor, and the resolved binder
//! array, once computed, is cached and never invalidated.

use crate::handler::RouteHandler;
use hermes_bind::{ArgumentBinder, RequestBinderRegistry, ServerRequest};
use hermes_core::Argument;
use mime::Mime;
use std::sync::{Arc, OnceLock};

/// A request-matching predicate attached to a route.
pub type RoutePredicate = Arc<dyn Fn(&ServerRequest) -> bool + Send + Sync>;

/// Immutable, shared descriptor of one route's handler signature.
///
/// # Example
///
/// ```rust
/// use hermes_router::{FnRouteHandler, RouteInfo};
/// use hermes_core::{Argument, ArgumentValue, TypeSpec};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnRouteHandler::new(|_args| async move {
///     Ok(ArgumentValue::Null)
/// }));
/// let route = RouteInfo::builder(handler)
///     .argument(Argument::new("id", TypeSpec::Int))
///     .build();
///
/// assert_eq!(route.argument_count(), 1);
/// ```
pub struct RouteInfo {
    arguments: Vec<Argument>,
    input_names: Vec<String>,
    handler: Arc<dyn RouteHandler>,
    body_argument: Option<Argument>,
    body_argument_name: Option<String>,
    consumes: Vec<Mime>,
    produces: Vec<Mime>,
    predicates: Vec<RoutePredicate>,
    is_void: bool,
    binders: OnceLock<Vec<Option<Arc<dyn ArgumentBinder>>>>,
}

impl RouteInfo {
    /// Returns a builder around the route's handler.
    #[must_use]
    pub fn builder(handler: Arc<dyn RouteHandler>) -> RouteInfoBuilder {
        RouteInfoBuilder::new(handler)
    }

    /// Returns the declared arguments in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Returns the number of declared arguments.
    #[must_use]
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the argument at the given position.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of range; argument indexes are fixed for
    /// the lifetime of the route.
    #[must_use]
    pub fn argument(&self, index: usize) -> &Argument {
        &self.arguments[index]
    }

    /// Returns the resolved input name for each argument, parallel to
    /// [`RouteInfo::arguments`].
    #[must_use]
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Resolves the request-input name for an argument: the explicit bind
    /// name when present and non-empty, else the declared parameter name.
    #[must_use]
    pub fn resolve_input_name<'a>(&self, argument: &'a Argument) -> &'a str {
        argument.input_name()
    }

    /// Returns the route's handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        &self.handler
    }

    /// Returns the body argument.
    ///
    /// The explicitly declared body argument wins; otherwise the argument
    /// whose resolved input name equals the declared body-argument name, if
    /// any.
    #[must_use]
    pub fn body_argument(&self) -> Option<&Argument> {
        if let Some(argument) = &self.body_argument {
            return Some(argument);
        }
        let name = self.body_argument_name.as_deref()?;
        self.arguments
            .iter()
            .enumerate()
            .find(|(i, _)| self.input_names[*i] == name)
            .map(|(_, argument)| argument)
    }

    /// Returns the declared body-argument name, if any.
    #[must_use]
    pub fn body_argument_name(&self) -> Option<&str> {
        self.body_argument_name.as_deref()
    }

    /// Returns the media types this route consumes.
    #[must_use]
    pub fn consumes(&self) -> &[Mime] {
        &self.consumes
    }

    /// Returns the media types this route produces.
    #[must_use]
    pub fn produces(&self) -> &[Mime] {
        &self.produces
    }

    /// Returns true if the handler returns no value.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.is_void
    }

    /// Returns true if every predicate accepts the request.
    ///
    /// An empty predicate list matches everything.
    #[must_use]
    pub fn matching(&self, request: &ServerRequest) -> bool {
        self.predicates.iter().all(|p| p(request))
    }

    /// Resolves the per-argument binder array, computing it on first use.
    ///
    /// The computation is a pure function of immutable route data, so a
    /// concurrent duplicate computation is harmless; the cell stores the
    /// first result and never invalidates it.
    pub fn resolve_argument_binders(
        &self,
        registry: &dyn RequestBinderRegistry,
    ) -> &[Option<Arc<dyn ArgumentBinder>>] {
        self.binders.get_or_init(|| {
            self.arguments
                .iter()
                .map(|argument| registry.find_argument_binder(argument))
                .collect()
        })
    }
}

impl std::fmt::Debug for RouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteInfo")
            .field("arguments", &self.arguments)
            .field("body_argument_name", &self.body_argument_name)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("is_void", &self.is_void)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RouteInfo`].
pub struct RouteInfoBuilder {
    arguments: Vec<Argument>,
    handler: Arc<dyn RouteHandler>,
    body_argument: Option<Argument>,
    body_argument_name: Option<String>,
    consumes: Vec<Mime>,
    produces: Vec<Mime>,
    predicates: Vec<RoutePredicate>,
    is_void: bool,
}

impl RouteInfoBuilder {
    fn new(handler: Arc<dyn RouteHandler>) -> Self {
        Self {
            arguments: Vec::new(),
            handler,
            body_argument: None,
            body_argument_name: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            predicates: Vec::new(),
            is_void: false,
        }
    }

    /// Appends a declared argument.
    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Declares the body argument explicitly.
    #[must_use]
    pub fn body_argument(mut self, argument: Argument) -> Self {
        self.body_argument = Some(argument);
        self
    }

    /// Declares the body argument by name.
    #[must_use]
    pub fn body_argument_name(mut self, name: impl Into<String>) -> Self {
        self.body_argument_name = Some(name.into());
        self
    }

    /// Adds a consumed media type.
    #[must_use]
    pub fn consumes(mut self, mime: Mime) -> Self {
        self.consumes.push(mime);
        self
    }

    /// Adds a produced media type.
    #[must_use]
    pub fn produces(mut self, mime: Mime) -> Self {
        self.produces.push(mime);
        self
    }

    /// Adds a request-matching predicate.
    #[must_use]
    pub fn predicate(
        mut self,
        predicate: impl Fn(&ServerRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    /// Marks the handler as returning no value.
    #[must_use]
    pub fn void(mut self) -> Self {
        self.is_void = true;
        self
    }

    /// Builds the route descriptor.
    #[must_use]
    pub fn build(self) -> Arc<RouteInfo> {
        let input_names = self
            .arguments
            .iter()
            .map(|a| a.input_name().to_string())
            .collect();
        Arc::new(RouteInfo {
            arguments: self.arguments,
            input_names,
            handler: self.handler,
            body_argument: self.body_argument,
            body_argument_name: self.body_argument_name,
            consumes: self.consumes,
            produces: self.produces,
            predicates: self.predicates,
            is_void: self.is_void,
            binders: OnceLock::new(),
        })
    }
}

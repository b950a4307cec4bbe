//! The per-request binding state machine.
//!
//! A [`RouteMatch`] owns one request's argument slots for a matched route
//! and walks them from unbound to fulfilled: path variables first, then the
//! binder-application phase, then a final resolution pass inside
//! [`RouteMatch::execute`] that drains deferred resolvers and pending
//! handles before invoking the handler.
//!
//! Slot writes are single-assignment and the route-level fulfilled flag is
//! monotone. The structure is intended for sequential access by the
//! request-processing pipeline; the guard flags fail fast on re-entrant
//! misuse instead of locking.

use crate::error::RouteError;
use crate::route_info::RouteInfo;
use hermes_bind::{ArgumentBinder, BinderKind, RequestBinderRegistry, ServerRequest};
use hermes_core::{
    Argument, ArgumentValue, BindError, BindingResult, ConversionContext, ConversionService,
    PendingBinding,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Captured variables injected before argument binding (path/template
/// variables, error/status values). Insertion order is preserved; the direct
/// `invoke` path depends on it.
pub type VariableMap = IndexMap<String, ArgumentValue>;

/// A resolver postponed to the final resolution pass.
enum LateResolver {
    /// Re-invokes a binder (or a one-shot supplier) at execute time.
    Binder(Box<dyn FnMut() -> BindingResult + Send>),
    /// Polls an asynchronously produced value at execute time.
    Pending(PendingBinding),
}

/// One argument slot: unset, deferred, or fulfilled. A slot is written at
/// most once per request.
enum Slot {
    Unset,
    Deferred(LateResolver),
    Set(ArgumentValue),
}

impl Slot {
    fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// Mutable, per-request binding session for one matched route.
pub struct RouteMatch {
    route_info: Arc<RouteInfo>,
    conversion: Arc<dyn ConversionService>,
    variables: VariableMap,
    slots: Vec<Slot>,
    fulfilled: bool,
    binders_applied: bool,
}

impl RouteMatch {
    /// Creates a binding session for a route.
    #[must_use]
    pub fn new(route_info: Arc<RouteInfo>, conversion: Arc<dyn ConversionService>) -> Self {
        let count = route_info.argument_count();
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, || Slot::Unset);
        Self {
            route_info,
            conversion,
            variables: VariableMap::new(),
            slots,
            fulfilled: count == 0,
            binders_applied: false,
        }
    }

    /// Seeds the session with captured variables (path/template variables).
    #[must_use]
    pub fn with_variables(mut self, variables: VariableMap) -> Self {
        self.variables = variables;
        self
    }

    /// Returns the route descriptor.
    #[must_use]
    pub fn route_info(&self) -> &Arc<RouteInfo> {
        &self.route_info
    }

    /// Returns the captured variables.
    #[must_use]
    pub fn variable_values(&self) -> &VariableMap {
        &self.variables
    }

    /// Returns true once every argument slot is fulfilled. Monotone.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled
    }

    /// Returns true if the named argument's slot is fulfilled.
    #[must_use]
    pub fn is_satisfied(&self, name: &str) -> bool {
        self.route_info
            .input_names()
            .iter()
            .position(|n| n == name)
            .is_some_and(|i| self.slots[i].is_fulfilled())
    }

    /// Fulfills arguments from a map of named values.
    ///
    /// Every unfulfilled argument whose resolved input name is present is
    /// coerced and stored. Idempotent: already-fulfilled slots are untouched,
    /// so re-calling with a different value for the same argument is a no-op.
    pub fn fulfill(&mut self, new_values: &VariableMap) -> Result<(), BindError> {
        if self.fulfilled {
            return Ok(());
        }
        let route_info = Arc::clone(&self.route_info);
        for (index, input_name) in route_info.input_names().iter().enumerate() {
            if self.slots[index].is_fulfilled() {
                continue;
            }
            if let Some(value) = new_values.get(input_name) {
                if !value.is_null() {
                    let argument = route_info.argument(index).clone();
                    self.set_value(index, &argument, value.clone())?;
                }
            }
        }
        self.check_if_fulfilled();
        Ok(())
    }

    /// Registers a deferred resolver for a still-unfulfilled argument.
    ///
    /// The supplier runs only at execute time. At most one deferred resolver
    /// is kept per argument, and registrations for an already-fulfilled
    /// argument are no-ops.
    pub fn fulfill_on_execute(
        &mut self,
        name: &str,
        supplier: impl FnOnce() -> Option<ArgumentValue> + Send + 'static,
    ) {
        let route_info = Arc::clone(&self.route_info);
        for (index, input_name) in route_info.input_names().iter().enumerate() {
            if self.slots[index].is_fulfilled() {
                continue;
            }
            if input_name == name {
                let mut supplier = Some(supplier);
                self.slots[index] = Slot::Deferred(LateResolver::Binder(Box::new(move || {
                    supplier.take().map_or_else(BindingResult::unsatisfied, |f| {
                        f().map_or_else(BindingResult::unsatisfied, BindingResult::satisfied)
                    })
                })));
                return;
            }
        }
    }

    /// The binder-application phase. Runs exactly once per request.
    ///
    /// For each unfulfilled argument without a deferred resolver: captured
    /// variables win; otherwise the argument's binder is resolved from the
    /// registry and classified. Ordinary and non-blocking body binders apply
    /// immediately; blocking body binders and request-bean binders are
    /// deferred. A declared-nullable argument with no binder is stored as
    /// null.
    ///
    /// # Panics
    ///
    /// Panics if called a second time: an internal protocol error, not a
    /// request-level failure.
    pub fn fulfill_binders(
        &mut self,
        registry: &dyn RequestBinderRegistry,
        request: &Arc<ServerRequest>,
    ) -> Result<(), BindError> {
        if self.fulfilled {
            return Ok(());
        }
        assert!(!self.binders_applied, "argument binders already processed");

        let route_info = Arc::clone(&self.route_info);
        let binders = route_info.resolve_argument_binders(registry);
        for index in 0..route_info.argument_count() {
            if !matches!(self.slots[index], Slot::Unset) {
                continue;
            }
            let argument = route_info.argument(index).clone();
            let input_name = &route_info.input_names()[index];
            if let Some(value) = self.variables.get(input_name) {
                if !value.is_null() {
                    let value = value.clone();
                    self.set_value(index, &argument, value)?;
                    continue;
                }
            }
            match &binders[index] {
                Some(binder) => {
                    self.fulfill_value(index, &argument, Arc::clone(binder), request)?;
                }
                None if argument.is_nullable() => {
                    self.slots[index] = Slot::Set(ArgumentValue::Null);
                }
                None => {
                    tracing::debug!(
                        argument = argument.name(),
                        "no binder found for required argument"
                    );
                }
            }
        }
        self.check_if_fulfilled();
        self.binders_applied = true;
        Ok(())
    }

    /// Drains deferred resolvers and invokes the handler.
    ///
    /// Routes with no declared arguments invoke directly. Otherwise the
    /// binder-application phase must have run; each still-unfulfilled
    /// argument is resolved through its deferred resolver, then through
    /// captured-variable lookup, and anything still missing raises an
    /// unsatisfied-route failure.
    ///
    /// # Panics
    ///
    /// Panics if arguments are required and the binder-application phase has
    /// not run.
    pub async fn execute(&mut self) -> Result<ArgumentValue, RouteError> {
        let route_info = Arc::clone(&self.route_info);
        if route_info.argument_count() == 0 {
            return route_info
                .handler()
                .call(Vec::new())
                .await
                .map_err(RouteError::Handler);
        }
        if !self.fulfilled {
            assert!(self.binders_applied, "argument binders not processed");
            for index in 0..route_info.argument_count() {
                if self.slots[index].is_fulfilled() {
                    continue;
                }
                let argument = route_info.argument(index).clone();
                if let Slot::Deferred(resolver) =
                    std::mem::replace(&mut self.slots[index], Slot::Unset)
                {
                    let result = match resolver {
                        LateResolver::Binder(mut rebind) => rebind(),
                        LateResolver::Pending(pending) => BindingResult::Pending(pending),
                    };
                    self.set_binding_result_or_fail(index, &argument, result)?;
                }
                if !self.slots[index].is_fulfilled() {
                    let input_name = &route_info.input_names()[index];
                    if let Some(value) = self.variables.get(input_name) {
                        if !value.is_null() {
                            let value = value.clone();
                            self.set_value(index, &argument, value)?;
                        }
                    }
                }
                if !self.slots[index].is_fulfilled() {
                    return Err(BindError::unsatisfied(&argument).into());
                }
            }
            self.fulfilled = true;
        }
        let values = self.take_values();
        route_info
            .handler()
            .call(values)
            .await
            .map_err(RouteError::Handler)
    }

    /// Direct invocation with already-known values, bypassing the
    /// request-binding phase. Used by error- and status-route dispatch.
    ///
    /// Values are matched to arguments by name against the captured
    /// variables first, then from the shared variable iterator, then from
    /// the remaining supplied values in order; each is converted to the
    /// declared type.
    ///
    /// # Panics
    ///
    /// Panics on a wrong argument count or an inconvertible value: a
    /// programming-contract error on the caller's side.
    pub async fn invoke(&self, values: Vec<ArgumentValue>) -> Result<ArgumentValue, RouteError> {
        let route_info = &self.route_info;
        if route_info.argument_count() == 0 {
            return route_info
                .handler()
                .call(Vec::new())
                .await
                .map_err(RouteError::Handler);
        }

        let mut resolved = Vec::with_capacity(route_info.argument_count());
        let mut variable_iter = self.variables.values();
        let mut supplied_iter = values.into_iter();
        for argument in route_info.arguments() {
            let value = match self.variables.get(argument.name()) {
                Some(value) if !value.is_null() => value.clone(),
                _ => match variable_iter.next() {
                    Some(value) => value.clone(),
                    None => supplied_iter
                        .next()
                        .unwrap_or_else(|| panic!("wrong number of arguments to route handler")),
                },
            };
            let mut ctx = ConversionContext::of(argument);
            let converted = self
                .conversion
                .convert(value, argument, &mut ctx)
                .unwrap_or_else(|| {
                    panic!(
                        "wrong argument types to route handler: argument [{}]",
                        argument.name()
                    )
                });
            resolved.push(converted);
        }
        route_info
            .handler()
            .call(resolved)
            .await
            .map_err(RouteError::Handler)
    }

    fn fulfill_value(
        &mut self,
        index: usize,
        argument: &Argument,
        binder: Arc<dyn ArgumentBinder>,
        request: &Arc<ServerRequest>,
    ) -> Result<(), BindError> {
        match binder.kind() {
            BinderKind::BlockingBody | BinderKind::RequestBean => {
                // Blocking body binders need the fully received body;
                // bean binders resolve after the simple bindings.
                self.slots[index] = Slot::Deferred(LateResolver::Binder(Self::rebind(
                    argument.clone(),
                    binder,
                    Arc::clone(request),
                )));
                return Ok(());
            }
            BinderKind::Ordinary | BinderKind::NonBlockingBody => {}
        }

        let mut ctx = ConversionContext::of(argument);
        let result = binder.bind(&mut ctx, request);
        if let BindingResult::Pending(pending) = result {
            self.slots[index] = Slot::Deferred(LateResolver::Pending(pending));
            return Ok(());
        }
        let is_set = if ctx.has_errors() {
            false
        } else {
            self.set_binding_result(index, argument, result)?
        };
        if !is_set {
            // Unsatisfied or erroring now: retry at execute time, and if a
            // conversion error occurred there, propagate it in preference to
            // an unsatisfied-route failure.
            self.slots[index] = Slot::Deferred(LateResolver::Binder(Self::rebind(
                argument.clone(),
                binder,
                Arc::clone(request),
            )));
        }
        Ok(())
    }

    fn rebind(
        argument: Argument,
        binder: Arc<dyn ArgumentBinder>,
        request: Arc<ServerRequest>,
    ) -> Box<dyn FnMut() -> BindingResult + Send> {
        Box::new(move || {
            let mut ctx = ConversionContext::of(&argument);
            let result = binder.bind(&mut ctx, &request);
            if let Some(error) = ctx.take_last_error() {
                return BindingResult::conversion_error(error);
            }
            result
        })
    }

    /// Stores a satisfied, present binding result. Returns whether a value
    /// was stored.
    fn set_binding_result(
        &mut self,
        index: usize,
        argument: &Argument,
        result: BindingResult,
    ) -> Result<bool, BindError> {
        match result {
            BindingResult::Satisfied(value) if !value.is_null() => {
                self.set_value(index, argument, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Stores a binding result at execute time, where failing to store is
    /// terminal: nullable arguments resolve to null, conversion errors take
    /// precedence, anything else is an unsatisfied route.
    fn set_binding_result_or_fail(
        &mut self,
        index: usize,
        argument: &Argument,
        result: BindingResult,
    ) -> Result<(), BindError> {
        let errors = match result {
            BindingResult::Satisfied(value) => {
                if value.is_null() {
                    Vec::new()
                } else {
                    self.set_value(index, argument, value)?;
                    return Ok(());
                }
            }
            BindingResult::Unsatisfied(errors) => errors,
            BindingResult::Pending(pending) => match pending.try_outcome() {
                Some(Ok(value)) => {
                    self.set_value(index, argument, value)?;
                    return Ok(());
                }
                Some(Err(error)) => vec![error],
                // Still pending at execute time.
                None => Vec::new(),
            },
        };
        if argument.is_nullable() || argument.is_optional() {
            self.slots[index] = Slot::Set(ArgumentValue::Null);
            return Ok(());
        }
        if let Some(error) = errors.into_iter().next() {
            return Err(BindError::conversion(argument, error));
        }
        Err(BindError::unsatisfied(argument))
    }

    /// Coerces and stores a value into a slot.
    ///
    /// A null value fulfills the slot without conversion.
    fn set_value(
        &mut self,
        index: usize,
        argument: &Argument,
        value: ArgumentValue,
    ) -> Result<(), BindError> {
        if value.is_null() {
            self.slots[index] = Slot::Set(ArgumentValue::Null);
            return Ok(());
        }
        let converted = self.convert_value(argument, value)?;
        self.slots[index] = Slot::Set(converted);
        Ok(())
    }

    /// The value coercion algorithm shared by both binding paths.
    fn convert_value(
        &self,
        argument: &Argument,
        value: ArgumentValue,
    ) -> Result<ArgumentValue, BindError> {
        if value.is_instance_of(argument.type_spec())
            && !(argument.is_container_type() && argument.has_type_params())
        {
            return Ok(value);
        }
        let mut ctx = ConversionContext::of(argument);
        match self.conversion.convert(value, argument, &mut ctx) {
            Some(converted) => Ok(converted),
            None => match ctx.take_last_error() {
                None if argument.is_nullable() => Ok(ArgumentValue::Null),
                Some(error) => Err(BindError::conversion(argument, error)),
                None => Err(BindError::unsatisfied(argument)),
            },
        }
    }

    fn check_if_fulfilled(&mut self) {
        if !self.fulfilled {
            self.fulfilled = self.slots.iter().all(Slot::is_fulfilled);
        }
    }

    fn take_values(&mut self) -> Vec<ArgumentValue> {
        self.slots
            .iter_mut()
            .map(
                |slot| match std::mem::replace(slot, Slot::Set(ArgumentValue::Null)) {
                    Slot::Set(value) => value,
                    _ => ArgumentValue::Null,
                },
            )
            .collect()
    }
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route_info", &self.route_info)
            .field("fulfilled", &self.fulfilled)
            .field("binders_applied", &self.binders_applied)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FnRouteHandler, RouteHandler};
    use hermes_bind::{
        constant_binder, DefaultBinderRegistry, FnBinder, PartEvent, UploadObserver,
    };
    use hermes_core::{BindingSource, DefaultConversionService, TypeSpec};
    use http::{Method, Uri};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Handler that echoes its arguments as a JSON array of descriptions.
    fn echo_handler() -> Arc<dyn RouteHandler> {
        Arc::new(FnRouteHandler::new(|args: Vec<ArgumentValue>| async move {
            let rendered: Vec<serde_json::Value> = args
                .iter()
                .map(|arg| match arg {
                    ArgumentValue::Null => serde_json::Value::Null,
                    ArgumentValue::Int(i) => serde_json::json!(i),
                    ArgumentValue::Str(s) => serde_json::json!(s),
                    ArgumentValue::Bool(b) => serde_json::json!(b),
                    ArgumentValue::Json(v) => v.clone(),
                    other => serde_json::json!(format!("{other:?}")),
                })
                .collect();
            Ok(ArgumentValue::Json(serde_json::Value::Array(rendered)))
        }))
    }

    fn conversion() -> Arc<dyn ConversionService> {
        Arc::new(DefaultConversionService::new())
    }

    fn request() -> Arc<ServerRequest> {
        Arc::new(
            ServerRequest::builder()
                .method(Method::GET)
                .uri(Uri::from_static("/"))
                .build(),
        )
    }

    fn echoed(result: ArgumentValue) -> Vec<serde_json::Value> {
        match result {
            ArgumentValue::Json(serde_json::Value::Array(items)) => items,
            other => panic!("unexpected handler output: {other:?}"),
        }
    }

    fn variables(pairs: &[(&str, ArgumentValue)]) -> VariableMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_zero_argument_route_executes_directly() {
        let route = RouteInfo::builder(echo_handler()).build();
        let mut route_match = RouteMatch::new(route, conversion());

        assert!(route_match.is_fulfilled());
        // No binder phase required.
        let result = route_match.execute().await.unwrap();
        assert!(echoed(result).is_empty());
    }

    #[tokio::test]
    async fn test_fulfill_is_single_assignment() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("id", TypeSpec::Int))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match
            .fulfill(&variables(&[("id", ArgumentValue::from("1"))]))
            .unwrap();
        assert!(route_match.is_satisfied("id"));
        assert!(route_match.is_fulfilled());

        // Re-fulfilling with a different value is a no-op.
        route_match
            .fulfill(&variables(&[("id", ArgumentValue::from("999"))]))
            .unwrap();

        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!(1)]);
    }

    #[tokio::test]
    async fn test_fulfill_coerces_path_variables() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("count", TypeSpec::Int))
            .argument(Argument::new("name", TypeSpec::Str))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match
            .fulfill(&variables(&[
                ("count", ArgumentValue::from("7")),
                ("name", ArgumentValue::from("alice")),
            ]))
            .unwrap();

        let result = route_match.execute().await.unwrap();
        assert_eq!(
            echoed(result),
            vec![serde_json::json!(7), serde_json::json!("alice")]
        );
    }

    #[tokio::test]
    async fn test_fulfill_conversion_failure_raises() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("count", TypeSpec::Int))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        let err = route_match
            .fulfill(&variables(&[("count", ArgumentValue::from("NaN-ish"))]))
            .unwrap_err();
        assert!(matches!(err, BindError::Conversion { .. }));
    }

    #[test]
    #[should_panic(expected = "argument binders already processed")]
    fn test_binder_phase_twice_is_protocol_violation() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("q", TypeSpec::Str).from_source(BindingSource::Query))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        let _ = route_match.fulfill_binders(&registry, &request());
    }

    #[tokio::test]
    #[should_panic(expected = "argument binders not processed")]
    async fn test_execute_before_binder_phase_is_protocol_violation() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("q", TypeSpec::Str).from_source(BindingSource::Query))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        let _ = route_match.execute().await;
    }

    #[tokio::test]
    async fn test_query_binding_end_to_end() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("limit", TypeSpec::Int).from_source(BindingSource::Query))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::GET)
                .uri(Uri::from_static("/items?limit=12"))
                .build(),
        );

        route_match.fulfill_binders(&registry, &request).unwrap();
        assert!(route_match.is_fulfilled());

        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!(12)]);
    }

    #[tokio::test]
    async fn test_blocking_body_binder_always_defers() {
        // A blocking body binder must not be invoked during the binder
        // phase, only at execute time.
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_binder = Arc::clone(&calls);
        let binder: Arc<dyn hermes_bind::ArgumentBinder> = Arc::new(FnBinder::with_kind(
            BinderKind::BlockingBody,
            move |_ctx, _request| {
                calls_in_binder.fetch_add(1, Ordering::SeqCst);
                BindingResult::satisfied(ArgumentValue::from("body"))
            },
        ));
        let registry = DefaultBinderRegistry::new().register("payload", binder);

        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("payload", TypeSpec::Str))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match.fulfill_binders(&registry, &request()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!route_match.is_fulfilled());

        let result = route_match.execute().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(echoed(result), vec![serde_json::json!("body")]);
    }

    #[tokio::test]
    async fn test_satisfied_ordinary_binder_never_rebinds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_binder = Arc::clone(&calls);
        let binder: Arc<dyn hermes_bind::ArgumentBinder> =
            Arc::new(FnBinder::new(move |_ctx, _request| {
                calls_in_binder.fetch_add(1, Ordering::SeqCst);
                BindingResult::satisfied(ArgumentValue::Int(5))
            }));
        let registry = DefaultBinderRegistry::new().register("n", binder);

        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("n", TypeSpec::Int))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match.fulfill_binders(&registry, &request()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        route_match.execute().await.unwrap();
        // Satisfied immediately: no deferred resolver, no re-invocation.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bean_binder_resolves_after_simple_bindings() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("id", TypeSpec::Int))
            .argument(
                Argument::new("info", TypeSpec::Json).from_source(BindingSource::RequestBean),
            )
            .build();
        let mut route_match =
            RouteMatch::new(route, conversion()).with_variables(variables(&[(
                "id",
                ArgumentValue::from("3"),
            )]));
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        assert!(route_match.is_satisfied("id"));
        assert!(!route_match.is_satisfied("info"));

        let result = route_match.execute().await.unwrap();
        let items = echoed(result);
        assert_eq!(items[0], serde_json::json!(3));
        assert_eq!(items[1]["method"], "GET");
    }

    #[tokio::test]
    async fn test_nullable_argument_resolves_to_null() {
        let route = RouteInfo::builder(echo_handler())
            .argument(
                Argument::new("missing", TypeSpec::Str)
                    .from_source(BindingSource::Query)
                    .nullable(),
            )
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::Value::Null]);
    }

    #[tokio::test]
    async fn test_nullable_argument_without_binder_stored_as_null() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("anything", TypeSpec::Str).nullable())
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        assert!(route_match.is_fulfilled());
    }

    #[tokio::test]
    async fn test_unsatisfied_required_argument_fails_execute() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("token", TypeSpec::Str).from_source(BindingSource::Header))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        let err = route_match.execute().await.unwrap_err();
        assert!(err.is_unsatisfied());
    }

    #[tokio::test]
    async fn test_conversion_error_takes_precedence_over_unsatisfied() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("limit", TypeSpec::Int).from_source(BindingSource::Query))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::GET)
                .uri(Uri::from_static("/items?limit=tons"))
                .build(),
        );

        route_match.fulfill_binders(&registry, &request).unwrap();
        assert!(!route_match.is_fulfilled());

        let err = route_match.execute().await.unwrap_err();
        assert!(err.is_conversion(), "expected conversion error, got {err}");
    }

    #[tokio::test]
    async fn test_execute_falls_back_to_variables() {
        // An argument with no binder and no early variable match is filled
        // from the captured variables during the final pass.
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("late", TypeSpec::Str))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request()).unwrap();
        route_match
            .variables
            .insert("late".to_string(), ArgumentValue::from("arrived"));

        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!("arrived")]);
    }

    #[tokio::test]
    async fn test_fulfill_on_execute_defers_supplier() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("lazy", TypeSpec::Str))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match
            .fulfill_on_execute("lazy", || Some(ArgumentValue::from("supplied")));
        route_match.fulfill_binders(&registry, &request()).unwrap();

        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!("supplied")]);
    }

    #[tokio::test]
    async fn test_fulfill_on_execute_noop_for_fulfilled_argument() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("id", TypeSpec::Int))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match
            .fulfill(&variables(&[("id", ArgumentValue::Int(1))]))
            .unwrap();
        route_match.fulfill_on_execute("id", || Some(ArgumentValue::Int(2)));

        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!(1)]);
    }

    #[tokio::test]
    async fn test_pending_binding_resolved_before_execute() {
        let observer = UploadObserver::new();
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::POST)
                .uri(Uri::from_static("/upload"))
                .uploads(observer.clone())
                .build(),
        );
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("file", TypeSpec::StreamingUpload))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();

        route_match.fulfill_binders(&registry, &request).unwrap();
        assert!(!route_match.is_fulfilled());

        observer.publish(PartEvent::file(
            "file",
            "data.bin",
            None,
            bytes::Bytes::from_static(b"x"),
            true,
        ));
        // Let the binder task observe the event.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let result = route_match.execute().await.unwrap();
        let items = echoed(result);
        assert_eq!(items.len(), 1);
        assert!(items[0].as_str().unwrap().contains("StreamingFileUpload"));
    }

    #[tokio::test]
    async fn test_pending_binding_still_pending_fails_unsatisfied() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("file", TypeSpec::StreamingUpload))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());
        let registry = DefaultBinderRegistry::new();
        let request = Arc::new(
            ServerRequest::builder()
                .method(Method::POST)
                .uri(Uri::from_static("/upload"))
                .build(),
        );

        route_match.fulfill_binders(&registry, &request).unwrap();
        // No part ever arrives.
        let err = route_match.execute().await.unwrap_err();
        assert!(err.is_unsatisfied());
    }

    #[tokio::test]
    async fn test_invoke_matches_by_name_first() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("status", TypeSpec::Int))
            .build();
        let route_match = RouteMatch::new(route, conversion()).with_variables(variables(&[(
            "status",
            ArgumentValue::Int(404),
        )]));

        let result = route_match.invoke(Vec::new()).await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!(404)]);
    }

    #[tokio::test]
    async fn test_invoke_uses_positional_values() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("a", TypeSpec::Str))
            .argument(Argument::new("b", TypeSpec::Int))
            .build();
        let route_match = RouteMatch::new(route, conversion());

        let result = route_match
            .invoke(vec![ArgumentValue::from("x"), ArgumentValue::Int(2)])
            .await
            .unwrap();
        assert_eq!(
            echoed(result),
            vec![serde_json::json!("x"), serde_json::json!(2)]
        );
    }

    #[tokio::test]
    #[should_panic(expected = "wrong number of arguments")]
    async fn test_invoke_wrong_count_is_protocol_violation() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("a", TypeSpec::Str))
            .build();
        let route_match = RouteMatch::new(route, conversion());

        let _ = route_match.invoke(Vec::new()).await;
    }

    #[tokio::test]
    #[should_panic(expected = "wrong argument types")]
    async fn test_invoke_wrong_type_is_protocol_violation() {
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("a", TypeSpec::Int))
            .build();
        let route_match = RouteMatch::new(route, conversion());

        let _ = route_match
            .invoke(vec![ArgumentValue::from("not-an-int")])
            .await;
    }

    #[tokio::test]
    async fn test_constant_binder_through_registry() {
        let registry = DefaultBinderRegistry::new()
            .register("fixed", constant_binder(ArgumentValue::from("constant")));
        let route = RouteInfo::builder(echo_handler())
            .argument(Argument::new("fixed", TypeSpec::Str))
            .build();
        let mut route_match = RouteMatch::new(route, conversion());

        route_match.fulfill_binders(&registry, &request()).unwrap();
        let result = route_match.execute().await.unwrap();
        assert_eq!(echoed(result), vec![serde_json::json!("constant")]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever order values arrive in, the first write to a slot
            /// wins and later writes are no-ops.
            #[test]
            fn prop_fulfill_single_assignment(values in proptest::collection::vec(0i64..1000, 1..8)) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    let route = RouteInfo::builder(echo_handler())
                        .argument(Argument::new("n", TypeSpec::Int))
                        .build();
                    let mut route_match = RouteMatch::new(route, conversion());

                    for value in &values {
                        route_match
                            .fulfill(&variables(&[("n", ArgumentValue::Int(*value))]))
                            .unwrap();
                    }

                    let result = route_match.execute().await.unwrap();
                    assert_eq!(echoed(result), vec![serde_json::json!(values[0])]);
                });
            }
        }
    }
}

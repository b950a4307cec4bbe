//! # Hermes
//!
//! **Request-argument resolution and route dispatch engine for the Themis
//! Platform**
//!
//! Given a statically-known handler signature (a route) and an inbound HTTP
//! request, Hermes incrementally fulfills each declared argument — from path
//! variables, headers, query parameters, request bodies, and
//! multipart/streaming parts — and invokes the handler once every required
//! argument is satisfied. Some arguments resolve immediately, some require
//! the fully buffered body, and some (file uploads, streaming bodies)
//! resolve asynchronously and partially; the engine supports out-of-order,
//! idempotent, partial fulfillment and stays safe under re-entrant
//! resolution attempts.
//!
//! ## Quick Start
//!
//! ```rust
//! use hermes::router::{FnRouteHandler, RouteInfo, UriRouteInfo, UriTemplate};
//! use hermes::bind::{DefaultBinderRegistry, ServerRequest};
//! use hermes::core::{Argument, ArgumentValue, DefaultConversionService, TypeSpec};
//! use http::Method;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let handler = Arc::new(FnRouteHandler::new(|args: Vec<ArgumentValue>| async move {
//!     Ok(args.into_iter().next().unwrap_or(ArgumentValue::Null))
//! }));
//! let route = UriRouteInfo::new(
//!     Method::GET,
//!     UriTemplate::parse("/users/{id}")?,
//!     RouteInfo::builder(handler)
//!         .argument(Argument::new("id", TypeSpec::Int))
//!         .build(),
//!     Arc::new(DefaultConversionService::new()),
//! );
//!
//! let request = Arc::new(
//!     ServerRequest::builder()
//!         .method(Method::GET)
//!         .uri(http::Uri::from_static("/users/42"))
//!         .build(),
//! );
//!
//! let mut route_match = route.match_request(&request).expect("route matches");
//! let variables = route_match.variable_values().clone();
//! route_match.fulfill(&variables)?;
//! route_match.fulfill_binders(&DefaultBinderRegistry::new(), &request)?;
//!
//! let result = route_match.execute().await?;
//! assert!(matches!(result, ArgumentValue::Int(42)));
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export binder types
pub use hermes_bind as bind;

// Re-export router types
pub use hermes_router as router;

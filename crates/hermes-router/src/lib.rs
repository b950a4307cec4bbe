//! # Hermes Router
//!
//! Route descriptors and the request-argument binding state machine.
//!
//! A [`RouteInfo`] describes a handler signature once, at route-table build
//! time; a [`RouteMatch`] is the per-request binding session that fulfills
//! each declared argument — from path variables, request binders, and
//! deferred resolvers — and invokes the handler once every required
//! argument is satisfied.
//!
//! ## Binding lifecycle
//!
//! ```text
//! UriRouteInfo::match_path          captured variables
//!        │                                  │
//!        ▼                                  ▼
//!   RouteMatch ── fulfill(variables) ── fulfill_binders(registry, request)
//!        │                                  │
//!        │          deferred / pending resolvers drain here
//!        ▼                                  ▼
//!   execute() ───────────────────────► handler(args...)
//! ```
//!
//! Error- and status-route dispatch ([`ErrorRouteInfo`], [`StatusRouteInfo`])
//! construct a `RouteMatch` directly and complete it through the `invoke`
//! path.

#![doc(html_root_url = "https://docs.rs/hermes-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatch;
mod error;
mod handler;
mod route_info;
mod route_match;
mod template;
mod uri_route;

pub use dispatch::{ErrorRouteInfo, StatusRouteInfo};
pub use error::RouteError;
pub use handler::{FnRouteHandler, RouteHandler};
pub use route_info::{RouteInfo, RouteInfoBuilder, RoutePredicate};
pub use route_match::{RouteMatch, VariableMap};
pub use template::{Params, TemplateError, UriTemplate};
pub use uri_route::UriRouteInfo;

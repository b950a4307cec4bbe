//! # Hermes Bind
//!
//! Request model and argument binders for the Hermes routing engine.
//!
//! A binder is a strategy that extracts one declared argument's value from
//! an inbound request. Binders come in four kinds, which drive *when* the
//! engine applies them:
//!
//! | Kind | Applied | Example |
//! |------|---------|---------|
//! | `Ordinary` | immediately | [`QueryValueBinder`], [`HeaderValueBinder`], upload binders |
//! | `NonBlockingBody` | immediately (result may be pending) | [`StreamBodyBinder`] |
//! | `BlockingBody` | deferred to execute time | [`JsonBodyBinder`] |
//! | `RequestBean` | deferred to execute time | [`RequestBeanBinder`] |
//!
//! The upload binders subscribe to the request's [`UploadObserver`] — the
//! multiplexed stream of named part events — and resolve asynchronously: the
//! binding result reports pending until the upload identity promise
//! completes, while chunks keep flowing on an independently consumed
//! channel.

#![doc(html_root_url = "https://docs.rs/hermes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bean;
mod binder;
mod body;
mod header;
mod multipart_adapter;
mod observer;
mod publisher;
mod query;
mod request;
mod upload;

pub use bean::RequestBeanBinder;
pub use binder::{
    constant_binder, ArgumentBinder, BinderKind, DefaultBinderRegistry, FnBinder,
    RequestBinderRegistry,
};
pub use body::JsonBodyBinder;
pub use header::HeaderValueBinder;
pub use multipart_adapter::{
    publish_multipart, MultipartError, MultipartLimits, DEFAULT_MAX_BODY_SIZE,
};
pub use observer::{PartEvent, PartFeed, UploadObserver};
pub use publisher::StreamBodyBinder;
pub use query::QueryValueBinder;
pub use request::{Body, BodyChunks, ChunkResult, ServerRequest, ServerRequestBuilder};
pub use upload::{CompletedFileUploadBinder, StreamingFileUploadBinder};

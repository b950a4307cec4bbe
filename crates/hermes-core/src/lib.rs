//! # Hermes Core
//!
//! Core types for the Hermes request-argument resolution engine.
//!
//! This crate provides the leaf data model shared by the binder and router
//! layers:
//!
//! - [`Argument`] / [`ArgumentValue`] - declared-argument descriptors and
//!   runtime values
//! - [`ConversionService`] - value coercion with structured error recording
//! - [`BindingResult`] - the tri-state outcome of one binding attempt
//! - [`Promise`] - one-shot, idempotently completable handoff cell
//! - [`StreamingFileUpload`] / [`CompletedFileUpload`] - multipart values
//! - [`BodyStream`] - a stream of converted body elements, bound as a value

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod argument;
mod binding;
mod convert;
mod multipart;
mod promise;
mod stream;

pub use argument::{Argument, ArgumentValue, BindingSource, TypeSpec};
pub use binding::{BindError, BindingResult, PendingBinding, PendingOutcome};
pub use convert::{ConversionContext, ConversionError, ConversionService, DefaultConversionService};
pub use multipart::{CompletedFileUpload, PartData, PartSender, StreamingFileUpload};
pub use promise::Promise;
pub use stream::{BodyStream, ElementResult};

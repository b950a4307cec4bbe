//! File-upload binders over the part-event source.
//!
//! Both binders subscribe to the request's multiplexed part-event stream and
//! resolve a one-shot promise; the binding result stays pending until the
//! promise completes, letting the engine defer final argument storage
//! without blocking anything else.

use crate::binder::ArgumentBinder;
use crate::observer::{PartEvent, PartFeed};
use crate::request::ServerRequest;
use bytes::BytesMut;
use hermes_core::{
    ArgumentValue, BindingResult, CompletedFileUpload, ConversionContext, ConversionError,
    PartData, PendingBinding, PendingOutcome, Promise, StreamingFileUpload,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Binds a streaming upload argument.
///
/// The upload handle resolves as soon as the first chunk of the matching
/// part arrives; all chunks for that part, including the first, continue
/// onto the handle's channel with a lifetime independent of the binding
/// result. The terminal event for the part closes the channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingFileUploadBinder;

impl StreamingFileUploadBinder {
    /// Creates a streaming upload binder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArgumentBinder for StreamingFileUploadBinder {
    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let input_name = ctx.argument().input_name().to_string();
        let promise: Promise<PendingOutcome> = Promise::new();
        let mut subscription = request.uploads().subscribe();

        let task_promise = promise.clone();
        tokio::spawn(async move {
            // The chunk channel exists before the identity resolves so no
            // chunk observed before resolution is lost.
            let (tx, rx) = mpsc::unbounded_channel::<PartData>();
            let mut receiver = Some(rx);

            while let Some(feed) = subscription.recv().await {
                match feed {
                    PartFeed::Error(message) => {
                        task_promise.complete(Err(ConversionError::new(message)));
                        return;
                    }
                    PartFeed::Event(event) => {
                        if event.name() != input_name {
                            continue;
                        }
                        let part =
                            PartData::new(event.chunk().clone(), event.content_type().cloned());
                        if event.is_file() && !task_promise.is_complete() {
                            if let Some(rx) = receiver.take() {
                                let upload = StreamingFileUpload::new(
                                    event.name(),
                                    event.file_name().map(str::to_string),
                                    event.content_type().cloned(),
                                    rx,
                                );
                                tracing::trace!(part = input_name.as_str(), "upload resolved");
                                task_promise.complete(Ok(ArgumentValue::Upload(upload)));
                            }
                        }
                        let _ = tx.send(part);
                        if event.is_completed() {
                            // Dropping the sender and the subscription closes
                            // the chunk channel and cancels delivery.
                            return;
                        }
                    }
                }
            }
        });

        BindingResult::Pending(PendingBinding::new(promise))
    }
}

/// Binds a completed upload argument.
///
/// Consumes one event at a time, skipping non-matching parts, buffers the
/// matching part eagerly, and drops its subscription once resolved; the
/// subscription is cancelled at most once.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletedFileUploadBinder;

impl CompletedFileUploadBinder {
    /// Creates a completed upload binder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArgumentBinder for CompletedFileUploadBinder {
    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let input_name = ctx.argument().input_name().to_string();
        let promise: Promise<PendingOutcome> = Promise::new();
        let mut subscription = request.uploads().subscribe();

        let task_promise = promise.clone();
        tokio::spawn(async move {
            let mut buf = BytesMut::new();
            let mut matched: Option<PartEvent> = None;

            while let Some(feed) = subscription.recv().await {
                match feed {
                    PartFeed::Error(message) => {
                        task_promise.complete(Err(ConversionError::new(message)));
                        return;
                    }
                    PartFeed::Event(event) => {
                        if event.name() != input_name || !event.is_file() {
                            // Not ours: request the next event.
                            continue;
                        }
                        buf.extend_from_slice(event.chunk());
                        let completed = event.is_completed();
                        matched = Some(event);
                        if completed {
                            break;
                        }
                    }
                }
            }

            if let Some(event) = matched {
                let upload = CompletedFileUpload::new(
                    event.name(),
                    event.file_name().map(str::to_string),
                    event.content_type().cloned(),
                    buf.freeze(),
                );
                task_promise.complete(Ok(ArgumentValue::CompletedUpload(upload)));
            }
            // Returning drops the subscription: cancelled exactly once.
        });

        BindingResult::Pending(PendingBinding::new(promise))
    }
}
